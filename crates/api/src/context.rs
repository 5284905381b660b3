use storefront_auth::{Role, TokenClaims};
use storefront_core::AccountId;

/// Authenticated identity for a request.
///
/// Inserted by the auth middleware once the token passed every check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    account_id: AccountId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(account_id: AccountId, role: Role) -> Self {
        Self { account_id, role }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// The raw token the request was authenticated with, plus its decoded claims.
///
/// Logout needs both: the raw string is the revocation key, the claims give
/// the remaining lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    raw: String,
    claims: TokenClaims,
}

impl AuthToken {
    pub fn new(raw: impl Into<String>, claims: TokenClaims) -> Self {
        Self {
            raw: raw.into(),
            claims,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }
}
