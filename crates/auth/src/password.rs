//! Credential hashing and verification.
//!
//! Passwords are hashed with bcrypt (salted, deliberately slow). bcrypt
//! compares digests in constant time. Both operations are CPU-bound: async
//! callers should run them on a blocking thread.

use storefront_core::DomainError;
use thiserror::Error;

/// Default bcrypt cost (salt rounds) for new hashes.
pub const DEFAULT_COST: u32 = 8;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// A stored password hash (modular crypt format).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash loaded from the datastore. No validation is performed here:
    /// a malformed hash simply never verifies.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

pub fn hash_password(raw: &str, cost: u32) -> Result<PasswordHash, PasswordError> {
    Ok(PasswordHash(bcrypt::hash(raw, cost)?))
}

/// Check `raw` against a stored hash.
///
/// Never fails: any error (malformed hash, unsupported cost) counts as a
/// mismatch.
pub fn verify_password(raw: &str, stored_hash: &str) -> bool {
    match bcrypt::verify(raw, stored_hash) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::debug!(error = %e, "password verification failed");
            false
        }
    }
}

/// Password policy for new accounts: 8 to 16 characters, no spaces.
pub fn check_password_policy(raw: &str) -> Result<(), DomainError> {
    let len = raw.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) || raw.contains(' ') {
        return Err(DomainError::validation("Password is invalid or contains spaces"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt accepts; keeps the suite fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Passw0rd", TEST_COST).unwrap();
        assert!(verify_password("Passw0rd", hash.as_str()));
        assert!(!verify_password("passw0rd", hash.as_str()));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Passw0rd", TEST_COST).unwrap();
        let b = hash_password("Passw0rd", TEST_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("Passw0rd", ""));
        assert!(!verify_password("Passw0rd", "not-a-bcrypt-hash"));
        assert!(!verify_password("Passw0rd", "$2b$04$short"));
    }

    #[test]
    fn debug_does_not_leak_hash() {
        let hash = hash_password("Passw0rd", TEST_COST).unwrap();
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }

    #[test]
    fn policy_bounds() {
        assert!(check_password_policy("Passw0rd").is_ok());
        assert!(check_password_policy("1234567890123456").is_ok());
        assert!(check_password_policy("short").is_err());
        assert!(check_password_policy("12345678901234567").is_err());
        assert!(check_password_policy("has space1").is_err());
    }
}
