//! Token issuing and validation (HS256 JWT).
//!
//! The signing secret is handed to [`Hs256TokenCodec::new`] once at startup and
//! kept for the lifetime of the codec; there is no global key state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use storefront_core::AccountId;

use crate::{validate_claims, Role, TokenClaims, TokenValidationError};

/// Default validity window of an access token.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token lifetime out of range")]
    InvalidLifetime,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// A freshly minted token together with the claims it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Mints signed, time-bounded tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, subject: AccountId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;
}

/// Verifies a token's signature and time window.
///
/// Revocation is *not* checked here; that needs the revocation store.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenValidationError>;
}

/// HMAC-SHA256 token codec: issuer and validator sharing one secret.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();

        // Time checks are done by `validate_claims` against an injected clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer for Hs256TokenCodec {
    fn issue(&self, subject: AccountId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|_| TokenError::InvalidLifetime)?;
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidLifetime)?;

        let claims = TokenClaims::new(subject, role, now, expires_at);
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }
}

impl TokenValidator for Hs256TokenCodec {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenValidationError::Invalid(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> Hs256TokenCodec {
        Hs256TokenCodec::new(secret, DEFAULT_TOKEN_TTL)
    }

    #[test]
    fn issued_token_validates_and_carries_identity() {
        let codec = codec("test-secret");
        let subject = AccountId::new();
        let now = Utc::now();

        let issued = codec.issue(subject, Role::Staff, now).unwrap();
        let claims = codec.validate(&issued.token, now).unwrap();

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn token_expires_after_ttl() {
        let codec = Hs256TokenCodec::new("test-secret", Duration::from_secs(60));
        let now = Utc::now();
        let issued = codec.issue(AccountId::new(), Role::Customer, now).unwrap();

        let later = issued.claims.expires_at();
        assert_eq!(codec.validate(&issued.token, later), Err(TokenValidationError::Expired));
    }

    #[test]
    fn different_secret_is_rejected() {
        let now = Utc::now();
        let issued = codec("secret-1").issue(AccountId::new(), Role::Admin, now).unwrap();

        let err = codec("secret-2").validate(&issued.token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Invalid(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = codec("test-secret").validate("invalid.token.here", Utc::now()).unwrap_err();
        assert!(matches!(err, TokenValidationError::Invalid(_)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec("test-secret");
        let now = Utc::now();
        let issued = codec.issue(AccountId::new(), Role::Customer, now).unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        let forged = codec.issue(AccountId::new(), Role::Admin, now).unwrap();
        let forged_payload = forged.token.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;

        let err = codec.validate(&parts.join("."), now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Invalid(_)));
    }

    #[test]
    fn debug_hides_keys() {
        let rendered = format!("{:?}", codec("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
