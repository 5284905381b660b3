//! Server-side token revocation.
//!
//! A revocation entry maps the exact token string to a sentinel and lives for
//! precisely the token's remaining lifetime: once the token would have expired
//! anyway, the entry disappears on its own, which bounds the store's size.
//!
//! ## Failure policy
//!
//! Fail-closed. Every store call is bounded by a timeout; an error or timeout
//! surfaces as [`RevocationError`] and callers deny the request (or report the
//! logout as failed). A token is never let through because the store was
//! unreachable.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_auth::TokenClaims;

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemoryRevocationStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisRevocationStore;

/// Value stored under a revoked token's key.
pub const REVOKED_SENTINEL: &str = "revoked";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevocationError {
    #[error("revocation store unavailable: {0}")]
    Unavailable(String),

    #[error("revocation store did not answer within {0:?}")]
    Timeout(Duration),
}

/// Storage for revocation entries.
///
/// Implementations are shared by every request task. Entries for different
/// tokens are independent; writing the same token twice must leave a single
/// entry.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record `token` as revoked for `ttl`.
    async fn put(&self, token: &str, ttl: Duration) -> Result<(), RevocationError>;

    /// Whether a live entry exists for `token`.
    async fn contains(&self, token: &str) -> Result<bool, RevocationError>;
}

#[async_trait]
impl<S> RevocationStore for Arc<S>
where
    S: RevocationStore + ?Sized,
{
    async fn put(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        (**self).put(token, ttl).await
    }

    async fn contains(&self, token: &str) -> Result<bool, RevocationError> {
        (**self).contains(token).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// An entry was written with this TTL.
    Revoked { ttl: Duration },
    /// The token had already expired; nothing to protect.
    AlreadyExpired,
    /// A live entry already existed; nothing was written.
    AlreadyRevoked,
}

/// Client used by the request pipeline and the session service.
#[derive(Clone)]
pub struct RevocationClient {
    store: Arc<dyn RevocationStore>,
    timeout: Duration,
}

impl RevocationClient {
    pub fn new(store: Arc<dyn RevocationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Revoke `token` until its natural expiry.
    ///
    /// Idempotent: revoking twice, or revoking an expired token, succeeds.
    #[tracing::instrument(skip_all, fields(sub = %claims.sub))]
    pub async fn revoke(
        &self,
        token: &str,
        claims: &TokenClaims,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, RevocationError> {
        let Some(ttl) = claims.remaining_lifetime(now).and_then(|d| d.to_std().ok()) else {
            tracing::debug!("token already expired; revocation is a no-op");
            return Ok(RevokeOutcome::AlreadyExpired);
        };

        self.bounded(self.store.put(token, ttl)).await?;
        Ok(RevokeOutcome::Revoked { ttl })
    }

    pub async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        self.bounded(self.store.contains(token)).await
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, RevocationError>
    where
        F: Future<Output = Result<T, RevocationError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RevocationError::Timeout(self.timeout)),
        }
    }
}

impl core::fmt::Debug for RevocationClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RevocationClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
