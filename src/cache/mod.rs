// Cache module for the remote key-value store.
// Holds key construction, TTL classes, and the safely-degrading store.

pub mod keys;
pub mod store;

pub use store::{CacheBackend, CacheError, CacheResult, CacheStore, MemoryBackend, RedisBackend};
