use std::collections::HashMap;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use uuid::Uuid;

use crate::domain::models::{ContentKind, CounterKind};
use crate::error::ServiceResult;

/// Durable key -> integer store with atomic increments.
///
/// Counters are keyed by (content kind, content id, counter kind). All
/// mutations are atomic at the storage layer, so concurrent writers never
/// lose updates; the application never does read-modify-write.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add `delta` and return the new value.
    async fn increment(
        &self,
        kind: ContentKind,
        id: Uuid,
        counter: CounterKind,
        delta: i64,
    ) -> ServiceResult<i64>;

    /// Point read; absent counters read as 0.
    async fn read(&self, kind: ContentKind, id: Uuid, counter: CounterKind) -> ServiceResult<i64>;

    /// Batch read for ranking paths; absent counters read as 0.
    async fn read_many(
        &self,
        kind: ContentKind,
        ids: &[Uuid],
        counter: CounterKind,
    ) -> ServiceResult<HashMap<Uuid, i64>>;
}

/// Canonical counter key, e.g. `curation:{id}:views`.
pub(crate) fn counter_key(kind: ContentKind, id: Uuid, counter: CounterKind) -> String {
    format!("{}:{}:{}", kind.as_str(), id, counter.as_str())
}

/// Redis-backed counter store.
///
/// Keys: {kind}:{id}:{counter} (e.g. `link:{link_id}:clicks`). Unlike a
/// cache, these keys are authoritative and carry no TTL.
#[derive(Clone)]
pub struct RedisCounterStore {
    redis: ConnectionManager,
}

impl RedisCounterStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(
        &self,
        kind: ContentKind,
        id: Uuid,
        counter: CounterKind,
        delta: i64,
    ) -> ServiceResult<i64> {
        let key = counter_key(kind, id, counter);
        let mut conn = self.redis.clone();
        let new_value: i64 = conn.incr(&key, delta).await?;
        Ok(new_value)
    }

    async fn read(&self, kind: ContentKind, id: Uuid, counter: CounterKind) -> ServiceResult<i64> {
        let key = counter_key(kind, id, counter);
        let mut conn = self.redis.clone();
        let value: Option<i64> = conn.get(&key).await?;
        Ok(value.unwrap_or(0))
    }

    async fn read_many(
        &self,
        kind: ContentKind,
        ids: &[Uuid],
        counter: CounterKind,
    ) -> ServiceResult<HashMap<Uuid, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| counter_key(kind, *id, counter))
            .collect();
        let mut conn = self.redis.clone();
        let values: Vec<Option<i64>> = conn.mget(&keys).await?;

        Ok(ids
            .iter()
            .zip(values)
            .map(|(id, value)| (*id, value.unwrap_or(0)))
            .collect())
    }
}
