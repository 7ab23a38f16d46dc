use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::error::ServiceResult;

/// TTL key-value store with atomic set-if-absent semantics.
///
/// Entries expire on their own; nothing ever deletes them explicitly. When
/// several callers race on the same absent key, exactly one observes `true`.
#[async_trait]
pub trait DedupCache: Send + Sync {
    /// Returns true when the key was absent and has now been set with `ttl`.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> ServiceResult<bool>;
}

/// Redis-backed dedup cache.
///
/// Issues `SET key 1 NX EX ttl` as a single command, so the first-writer
/// decision is made inside Redis.
#[derive(Clone)]
pub struct RedisDedupCache {
    redis: ConnectionManager,
}

impl RedisDedupCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl DedupCache for RedisDedupCache {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> ServiceResult<bool> {
        let mut conn = self.redis.clone();
        // EX rejects 0, so clamp to at least one second
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }
}
