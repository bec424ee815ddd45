//! Read-through TTL cache over a pluggable key-value store.
//!
//! Entries are never purged here. An entry older than the caller's TTL reads
//! as absent and is overwritten by the next successful fetch for that key.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use redis::aio::MultiplexedConnection;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const REDIS_KEY_PREFIX: &str = "cache:";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt cache entry for '{0}'")]
    Corrupt(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    /// Serialized JSON.
    pub value: String,
    pub written_at: DateTime<Utc>,
}

/// Storage backend for cached lookup responses. One entry per key,
/// last write wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    async fn write(&self, entry: CacheEntry) -> Result<(), CacheError>;
}

// ────────────────────────────────────────────────────────────────────────────
// TtlCache
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn CacheStore>,
}

impl TtlCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.get_at(key, ttl, Utc::now()).await
    }

    /// Returns the cached value unless it is missing, older than `ttl`,
    /// unreadable, or not valid JSON. All of those read as absent.
    pub async fn get_at(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> Option<Value> {
        let entry = match self.store.read(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {key}, treating as miss: {e}");
                return None;
            }
        };

        if now - entry.written_at > ttl {
            debug!("Cache entry for {key} is stale");
            return None;
        }

        match serde_json::from_str(&entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cache entry for {key} is not valid JSON: {e}");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &Value) {
        self.set_at(key, value, Utc::now()).await
    }

    /// Overwrites unconditionally. A failed write is logged and dropped; the
    /// caller already holds the fresh value.
    pub async fn set_at(&self, key: &str, value: &Value, now: DateTime<Utc>) {
        let entry = CacheEntry {
            key: key.to_string(),
            value: value.to_string(),
            written_at: now,
        };
        if let Err(e) = self.store.write(entry).await {
            warn!("Cache write failed for {key}: {e}");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-process store
// ────────────────────────────────────────────────────────────────────────────

/// Process-local store, used when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn write(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis store
// ────────────────────────────────────────────────────────────────────────────

/// Stores each entry as a hash `{value, written_at}` under `cache:{key}`.
/// No EXPIRE is set; staleness is judged at read time.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: MultiplexedConnection,
}

impl RedisCacheStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let mut conn = self.conn.clone();
        let (value, written_at): (Option<String>, Option<i64>) = redis::cmd("HMGET")
            .arg(format!("{REDIS_KEY_PREFIX}{key}"))
            .arg("value")
            .arg("written_at")
            .query_async(&mut conn)
            .await?;

        let (value, written_at_ms) = match (value, written_at) {
            (Some(v), Some(w)) => (v, w),
            (None, None) => return Ok(None),
            _ => return Err(CacheError::Corrupt(key.to_string())),
        };

        let written_at = Utc
            .timestamp_millis_opt(written_at_ms)
            .single()
            .ok_or_else(|| CacheError::Corrupt(key.to_string()))?;

        Ok(Some(CacheEntry {
            key: key.to_string(),
            value,
            written_at,
        }))
    }

    async fn write(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("HSET")
            .arg(format!("{REDIS_KEY_PREFIX}{}", entry.key))
            .arg("value")
            .arg(entry.value)
            .arg("written_at")
            .arg(entry.written_at.timestamp_millis())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Store whose every call fails, for the degrade-to-miss path.
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Corrupt(key.to_string()))
        }

        async fn write(&self, entry: CacheEntry) -> Result<(), CacheError> {
            Err(CacheError::Corrupt(entry.key))
        }
    }

    fn memory_cache() -> TtlCache {
        TtlCache::new(Arc::new(MemoryCacheStore::new()))
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let cache = memory_cache();
        let value = json!({"word": "ember", "score": 900});
        let now = Utc::now();
        cache.set_at("dict:ember", &value, now).await;
        for ttl_ms in [1, 1_000, 86_400_000] {
            assert_eq!(
                cache
                    .get_at("dict:ember", Duration::milliseconds(ttl_ms), now)
                    .await,
                Some(value.clone())
            );
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let cache = memory_cache();
        assert_eq!(cache.get("nope", Duration::hours(1)).await, None);
    }

    #[tokio::test]
    async fn test_entry_older_than_ttl_is_absent() {
        let cache = memory_cache();
        let written = Utc::now() - Duration::hours(2);
        cache.set_at("wp:sum:Etna", &json!({"title": "Etna"}), written).await;

        assert!(cache.get("wp:sum:Etna", Duration::hours(3)).await.is_some());
        assert_eq!(cache.get("wp:sum:Etna", Duration::hours(1)).await, None);
    }

    #[tokio::test]
    async fn test_age_equal_to_ttl_is_still_fresh() {
        let cache = memory_cache();
        let written = Utc::now();
        cache.set_at("k", &json!(1), written).await;
        let ttl = Duration::seconds(30);
        assert!(cache.get_at("k", ttl, written + ttl).await.is_some());
        assert!(cache
            .get_at("k", ttl, written + ttl + Duration::milliseconds(1))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_stale_entry_is_overwritten_not_deleted() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = TtlCache::new(store.clone());
        let old = Utc::now() - Duration::days(30);
        cache.set_at("cn:lava:25", &json!("old"), old).await;

        assert_eq!(cache.get("cn:lava:25", Duration::days(3)).await, None);
        assert!(store.read("cn:lava:25").await.unwrap().is_some());

        cache.set("cn:lava:25", &json!("new")).await;
        assert_eq!(
            cache.get("cn:lava:25", Duration::days(3)).await,
            Some(json!("new"))
        );
    }

    #[tokio::test]
    async fn test_store_failures_degrade_to_miss() {
        let cache = TtlCache::new(Arc::new(BrokenStore));
        cache.set("k", &json!(1)).await;
        assert_eq!(cache.get("k", Duration::hours(1)).await, None);
    }

    #[tokio::test]
    async fn test_non_json_value_reads_as_absent() {
        let store = Arc::new(MemoryCacheStore::new());
        store
            .write(CacheEntry {
                key: "k".to_string(),
                value: "{not json".to_string(),
                written_at: Utc::now(),
            })
            .await
            .unwrap();
        let cache = TtlCache::new(store);
        assert_eq!(cache.get("k", Duration::hours(1)).await, None);
    }
}
