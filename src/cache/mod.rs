//! Cache Module
//!
//! Dual-backend caching: a distributed Redis-compatible store when reachable,
//! an in-process TTL store otherwise, orchestrated by [`CacheService`].

mod backend;
mod distributed;
mod entry;
mod memory;
mod policy;
mod remote;
mod service;
mod stats;

#[cfg(test)]
mod property_tests;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use backend::{tag_key, BackendKind, TAG_PREFIX};
pub use distributed::{parse_info, DistributedStore, MemoryStats, RetryPolicy};
pub use entry::{normalize_ttl, CacheEntry, MAX_TTL_SECONDS};
pub use memory::MemoryStore;
pub use policy::{build_key, ttl_for, CacheCategory, KEY_SEPARATOR};
pub use remote::{redact_url, Connector, RedisConnector, RemoteConnection};
pub use service::{CacheItem, CacheService, SetOptions};
pub use stats::{BackendCounters, CacheStats, CountersSnapshot};
