use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::warn;

/// Consumed collaborator: a plain key-value store with TTL expiry (§6).
/// Values are opaque bytes — the engine is responsible for JSON-encoding
/// the recommendation list before calling [`Cache::setex`].
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    async fn setex(&self, key: &str, ttl_seconds: u64, value: Vec<u8>) -> anyhow::Result<()>;
}

/// Redis-backed implementation, mirroring this codebase's raw-`redis::cmd`
/// style rather than the typed API, so the wire commands (`GET`/`SETEX`)
/// are visible at the call site.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn setex(&self, key: &str, ttl_seconds: u64, value: Vec<u8>) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

/// In-memory test double with real TTL expiry, used by the demo binary and
/// by engine tests that exercise cache-hit behavior (§8 invariant 8)
/// without standing up Redis.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let guard = self.entries.read().unwrap();
        match guard.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                warn!(cache_key = key, "cache entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn setex(&self, key: &str, ttl_seconds: u64, value: Vec<u8>) -> anyhow::Result<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_cache_round_trips() {
        let cache = InMemoryCache::new();
        assert!(cache.get("k").await.unwrap().is_none());
        cache.setex("k", 300, b"hello".to_vec()).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn in_memory_cache_expires() {
        let cache = InMemoryCache::new();
        cache.setex("k", 0, b"hello".to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("k").await.unwrap().is_none());
    }
}
