use std::collections::BTreeSet;

use thiserror::Error;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{0}' is not allowed for this action")]
    RoleNotAllowed(Role),
}

/// Set of roles allowed to reach a route.
///
/// Policies are plain values: the HTTP layer composes one per route group and
/// asks it about the role decoded from the request token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    allowed: BTreeSet<Role>,
}

impl RolePolicy {
    pub fn allow(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }

    /// Back-office accounts (staff and administrators).
    pub fn back_office() -> Self {
        Self::allow([Role::Staff, Role::Admin])
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Authorize a decoded role against a policy.
///
/// - No IO
/// - No panics
pub fn authorize(policy: &RolePolicy, role: Role) -> Result<(), AuthzError> {
    if policy.permits(role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotAllowed(role))
    }
}
