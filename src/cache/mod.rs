//! Cache-aside support for hot read paths.
//!
//! The cache is an optimization, never a source of truth: reads that
//! miss (or error) fall through to the database, and writes are
//! best-effort. Redis backs the cache in deployment; an in-process map
//! with expiry checks serves tests and single-instance setups.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

// In-memory cache implementation
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() > expires_at,
            None => false,
        }
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let store = self
            .store
            .read()
            .map_err(|e| CacheError::OperationFailed(e.to_string()))?;
        if let Some(entry) = store.get(key) {
            if entry.is_expired() {
                drop(store);
                let mut store = self
                    .store
                    .write()
                    .map_err(|e| CacheError::OperationFailed(e.to_string()))?;
                store.remove(key);
                Ok(None)
            } else {
                Ok(Some(entry.value.clone()))
            }
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut store = self
            .store
            .write()
            .map_err(|e| CacheError::OperationFailed(e.to_string()))?;
        store.insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut store = self
            .store
            .write()
            .map_err(|e| CacheError::OperationFailed(e.to_string()))?;
        store.remove(key);
        Ok(())
    }
}

// Redis cache implementation
#[derive(Clone)]
pub struct RedisCache {
    client: Arc<redis::Client>,
}

impl RedisCache {
    pub fn new(client: Arc<redis::Client>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.client.get_async_connection().await?;
        let result: Option<String> = conn.get(key).await?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.client.get_async_connection().await?;
        match ttl {
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1) as usize)
                    .await?
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

/// Namespaced JSON cache handle shared by the read-path services.
///
/// Read errors surface as misses and write/delete errors are logged and
/// swallowed, so a broken cache degrades to plain database reads.
#[derive(Clone)]
pub struct AppCache {
    backend: Arc<dyn CacheBackend>,
    namespace: String,
}

impl AppCache {
    pub fn new(backend: Arc<dyn CacheBackend>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn key(&self, parts: &[&str]) -> String {
        let mut key = self.namespace.clone();
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key = %key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "cache entry failed to deserialize; treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed; treating as miss");
                None
            }
        }
    }

    /// Best-effort write: failures are logged, never surfaced.
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "cache value failed to serialize; skipping write");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &raw, Some(ttl)).await {
            warn!(key = %key, error = %e, "cache write failed");
        }
    }

    /// Best-effort invalidation of a single key.
    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            warn!(key = %key, error = %e, "cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        n: u32,
    }

    #[tokio::test]
    async fn in_memory_set_get_delete() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn in_memory_entries_expire() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(cache.get("k").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn app_cache_round_trips_json() {
        let cache = AppCache::new(Arc::new(InMemoryCache::new()), "test");
        let key = cache.key(&["search", "q=shoes", "page=1"]);
        assert_eq!(key, "test:search:q=shoes:page=1");

        assert!(cache.get_json::<Payload>(&key).await.is_none());
        cache
            .put_json(&key, &Payload { n: 7 }, Duration::from_secs(60))
            .await;
        assert_eq!(cache.get_json::<Payload>(&key).await, Some(Payload { n: 7 }));

        cache.invalidate(&key).await;
        assert!(cache.get_json::<Payload>(&key).await.is_none());
    }

    struct FailingBackend;

    #[async_trait::async_trait]
    impl CacheBackend for FailingBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::OperationFailed("down".into()))
        }
        async fn set(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Option<Duration>,
        ) -> Result<(), CacheError> {
            Err(CacheError::OperationFailed("down".into()))
        }
        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::OperationFailed("down".into()))
        }
    }

    #[tokio::test]
    async fn broken_backend_degrades_to_misses() {
        let cache = AppCache::new(Arc::new(FailingBackend), "test");
        // Reads report a miss, writes and deletes do not panic or error
        assert!(cache.get_json::<Payload>("test:k").await.is_none());
        cache
            .put_json("test:k", &Payload { n: 1 }, Duration::from_secs(1))
            .await;
        cache.invalidate("test:k").await;
    }
}
