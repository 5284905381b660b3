//! Redis-backed revocation store.
//!
//! Protocol: `SET <token> revoked PX <ttl_ms>` to revoke, `EXISTS <token>` to
//! check. Redis expires the key on its own when the token would have expired.
//!
//! The connection is opened lazily on first use. `OnceCell` runs the
//! initialization once: concurrent first callers wait on the same attempt and
//! then share the multiplexed `ConnectionManager` (which also reconnects on its
//! own). A failed attempt leaves the cell empty so a later call can retry.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use super::{RevocationError, RevocationStore, REVOKED_SENTINEL};

pub struct RedisRevocationStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisRevocationStore {
    /// Parse the URL; no connection is made until first use (or [`Self::connect`]).
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, RevocationError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
        })
    }

    /// Establish the connection eagerly (startup warm-up).
    pub async fn connect(&self) -> Result<(), RevocationError> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&self) -> Result<ConnectionManager, RevocationError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                tracing::info!("connecting to redis revocation store");
                ConnectionManager::new(self.client.clone()).await
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "redis revocation store connection failed");
                unavailable(e)
            })?;
        Ok(conn.clone())
    }
}

impl core::fmt::Debug for RedisRevocationStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisRevocationStore")
            .field("connected", &self.conn.initialized())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        let mut conn = self.connection().await?;
        // PX 0 is rejected by Redis; sub-millisecond remainders round up.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        conn.pset_ex::<_, _, ()>(token, REVOKED_SENTINEL, ttl_ms)
            .await
            .map_err(unavailable)
    }

    async fn contains(&self, token: &str) -> Result<bool, RevocationError> {
        let mut conn = self.connection().await?;
        conn.exists::<_, bool>(token).await.map_err(unavailable)
    }
}

fn unavailable(e: redis::RedisError) -> RevocationError {
    RevocationError::Unavailable(e.to_string())
}
