use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::AccountId;

use crate::Role;

/// Claims carried by every access token.
///
/// Timestamps are Unix seconds so the token stays a standard JWT (`iat`/`exp`).
/// The token is self-describing: decoding it yields subject, role and expiry
/// without any lookup. Only revocation status needs the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / account identifier.
    pub sub: AccountId,

    /// Role granted to the subject at login time.
    pub role: Role,

    /// Issued-at (Unix seconds).
    pub iat: i64,

    /// Expiration (Unix seconds).
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(sub: AccountId, role: Role, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Time left before natural expiry, or `None` once the token is expired.
    ///
    /// This is exactly the TTL a revocation entry for this token must carry.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.expires_at() - now;
        if remaining > Duration::zero() {
            Some(remaining)
        } else {
            None
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Tolerated clock skew between the instance that issued a token and the one
/// validating it. Applies to `iat` only; expiry is exact.
pub const ISSUED_AT_LEEWAY_SECS: i64 = 30;

/// Deterministically validate token claims against `now`.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`TokenValidator`](crate::TokenValidator) before this is called.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now.timestamp() + ISSUED_AT_LEEWAY_SECS < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at() {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn claims(iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: AccountId::new(),
            role: Role::Customer,
            iat,
            exp,
        }
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let c = claims(1_000, 2_000);
        assert_eq!(validate_claims(&c, at(1_999)), Ok(()));
        assert_eq!(validate_claims(&c, at(2_000)), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_tokens_are_rejected() {
        let c = claims(1_000, 2_000);
        let too_early = 1_000 - ISSUED_AT_LEEWAY_SECS - 1;
        assert_eq!(validate_claims(&c, at(too_early)), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn issuer_clock_slightly_ahead_is_tolerated() {
        let c = claims(1_000, 2_000);
        assert_eq!(validate_claims(&c, at(1_000 - ISSUED_AT_LEEWAY_SECS)), Ok(()));
        assert_eq!(validate_claims(&c, at(995)), Ok(()));
    }

    #[test]
    fn empty_window_is_rejected_first() {
        let c = claims(2_000, 2_000);
        assert_eq!(
            validate_claims(&c, at(2_500)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn remaining_lifetime_tracks_expiry() {
        let c = claims(1_000, 2_000);
        assert_eq!(c.remaining_lifetime(at(1_500)), Some(Duration::seconds(500)));
        assert_eq!(c.remaining_lifetime(at(2_000)), None);
        assert_eq!(c.remaining_lifetime(at(3_000)), None);
    }

    proptest! {
        #[test]
        fn remaining_lifetime_agrees_with_validation(
            iat in 0i64..1_000_000,
            ttl in 1i64..100_000,
            offset in 0i64..200_000,
        ) {
            let c = claims(iat, iat + ttl);
            let now = at(iat + offset);
            let valid = validate_claims(&c, now).is_ok();
            prop_assert_eq!(valid, c.remaining_lifetime(now).is_some());
            if let Some(rem) = c.remaining_lifetime(now) {
                prop_assert_eq!(now + rem, c.expires_at());
            }
        }
    }
}
