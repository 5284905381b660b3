use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{RevocationError, RevocationStore};

/// In-memory revocation store for tests/dev.
///
/// Entries carry a deadline; expired entries are invisible to reads and are
/// purged on the next write.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    inner: RwLock<HashMap<String, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        // A panicked writer cannot leave a half-written entry behind.
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.values().filter(|deadline| **deadline > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> RevocationError {
        RevocationError::Unavailable("revocation map lock poisoned".to_string())
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn put(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        let now = Instant::now();
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        map.retain(|_, deadline| *deadline > now);
        map.insert(token.to_string(), now + ttl);
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, RevocationError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(token).is_some_and(|deadline| *deadline > Instant::now()))
    }
}
