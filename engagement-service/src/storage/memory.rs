//! Embedded storage backends.
//!
//! In-process implementations of the storage seams, backed by sharded maps.
//! Per-key operations go through the map entry API and are atomic with
//! respect to concurrent callers, which preserves the same race guarantees
//! the Redis backends give. Used by embedded deployments and the test suite.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::models::{ContentKind, CounterKind};
use crate::error::ServiceResult;

use super::counters::{counter_key, CounterStore};
use super::dedup::DedupCache;

/// Embedded counter store.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, i64>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(
        &self,
        kind: ContentKind,
        id: Uuid,
        counter: CounterKind,
        delta: i64,
    ) -> ServiceResult<i64> {
        let mut entry = self
            .counters
            .entry(counter_key(kind, id, counter))
            .or_insert(0);
        *entry += delta;
        Ok(*entry)
    }

    async fn read(&self, kind: ContentKind, id: Uuid, counter: CounterKind) -> ServiceResult<i64> {
        Ok(self
            .counters
            .get(&counter_key(kind, id, counter))
            .map(|value| *value)
            .unwrap_or(0))
    }

    async fn read_many(
        &self,
        kind: ContentKind,
        ids: &[Uuid],
        counter: CounterKind,
    ) -> ServiceResult<HashMap<Uuid, i64>> {
        let mut result = HashMap::with_capacity(ids.len());
        for id in ids {
            let value = self
                .counters
                .get(&counter_key(kind, *id, counter))
                .map(|value| *value)
                .unwrap_or(0);
            result.insert(*id, value);
        }
        Ok(result)
    }
}

/// Embedded TTL map with set-if-absent semantics.
///
/// An expired entry counts as absent and is replaced inside the same entry
/// operation, so the TTL-boundary race resolves to a single winner here too.
#[derive(Debug, Default)]
pub struct MemoryDedupCache {
    entries: DashMap<String, Instant>,
}

impl MemoryDedupCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DedupCache for MemoryDedupCache {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> ServiceResult<bool> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    Ok(false)
                } else {
                    occupied.insert(now + ttl);
                    Ok(true)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now + ttl);
                Ok(true)
            }
        }
    }
}
