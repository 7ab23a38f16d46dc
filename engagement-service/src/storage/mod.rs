pub mod counters;
pub mod dedup;
pub mod memory;

pub use counters::{CounterStore, RedisCounterStore};
pub use dedup::{DedupCache, RedisDedupCache};
pub use memory::{MemoryCounterStore, MemoryDedupCache};
