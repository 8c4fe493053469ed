//! Cache Service Module
//!
//! The backend-agnostic entry point used by application code. Routes every
//! call to the distributed backend when it is available and to the in-process
//! store otherwise, keeps running statistics, and absorbs every backend
//! failure into a safe default.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::backend::{Backend, BackendKind};
use crate::cache::distributed::{DistributedStore, MemoryStats};
use crate::cache::stats::{BackendCounters, CountersSnapshot};
use crate::cache::{CacheCategory, CacheStats, MemoryStore};
use crate::config::Config;
use crate::error::CacheError;

// == Set Options ==
/// Per-write options: expiry and tag membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// TTL in seconds; None stores without expiry
    pub ttl: Option<u64>,
    /// Tags to index the key under (distributed backend only)
    pub tags: Vec<String>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying the default TTL of `category`.
    pub fn for_category(category: CacheCategory) -> Self {
        Self::new().with_ttl(category.ttl())
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl = Some(ttl_seconds);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

// == Cache Item ==
/// One entry of a batch write.
#[derive(Debug, Clone)]
pub struct CacheItem<T> {
    pub key: String,
    pub value: T,
    pub options: SetOptions,
}

impl<T> CacheItem<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
            options: SetOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SetOptions) -> Self {
        self.options = options;
        self
    }
}

// == Cache Service ==
/// Dual-backend cache with statistics and tag invalidation.
///
/// Cache failures never reach the caller: reads degrade to misses, writes to
/// `false`, counts to `0`. Construct one per process and share it by `Arc`.
///
/// `get_or_set` does not deduplicate concurrent computations: callers racing
/// on the same missing key each run their computation and each write the
/// result, last write wins.
pub struct CacheService {
    distributed: Arc<DistributedStore>,
    memory: Arc<RwLock<MemoryStore>>,
    stats: Mutex<CacheStats>,
    counters: BackendCounters,
    enabled: AtomicBool,
}

impl CacheService {
    // == Constructors ==
    pub fn new(
        distributed: Arc<DistributedStore>,
        memory: Arc<RwLock<MemoryStore>>,
        enabled: bool,
    ) -> Self {
        Self {
            distributed,
            memory,
            stats: Mutex::new(CacheStats::new()),
            counters: BackendCounters::new(),
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Builds the service and its backends from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(DistributedStore::from_config(config)),
            Arc::new(RwLock::new(MemoryStore::new())),
            config.cache_enabled,
        )
    }

    /// A service backed only by a fresh in-process store.
    pub fn in_process() -> Self {
        Self::new(
            Arc::new(DistributedStore::disabled()),
            Arc::new(RwLock::new(MemoryStore::new())),
            true,
        )
    }

    // == Accessors ==
    pub fn distributed(&self) -> &Arc<DistributedStore> {
        &self.distributed
    }

    /// Shared handle to the in-process store, for the sweep task.
    pub fn memory_store(&self) -> Arc<RwLock<MemoryStore>> {
        Arc::clone(&self.memory)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Flips the administrative switch. Takes effect on the next call.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        info!(enabled, "Cache enabled flag changed");
    }

    /// Backend that currently serves calls, without triggering a connect.
    pub fn backend_kind(&self) -> BackendKind {
        if self.distributed.is_available() {
            BackendKind::Distributed
        } else {
            BackendKind::InProcess
        }
    }

    pub fn counters(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }

    pub async fn memory_stats(&self) -> Option<MemoryStats> {
        self.distributed.memory_stats().await
    }

    // == Get ==
    /// Reads and deserializes `key`. Any failure counts as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.admit() {
            return None;
        }

        let backend = self.route().await;
        let result = match backend.get(key).await {
            Ok(Some(raw)) => serde_json::from_str::<T>(&raw)
                .map(Some)
                .map_err(CacheError::from),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(value)) => {
                self.stats.lock().record_hit();
                debug!(key, backend = %backend.kind(), "Cache hit");
                Some(value)
            }
            Ok(None) => {
                self.stats.lock().record_miss();
                debug!(key, backend = %backend.kind(), "Cache miss");
                None
            }
            Err(e) => {
                self.absorb(&backend, "get", key, e).await;
                self.stats.lock().record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Serializes and stores `value`. Returns true when the value was written.
    ///
    /// Tags are registered after the write and only on the distributed
    /// backend; a failed tag registration leaves the write successful.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: &SetOptions,
    ) -> bool {
        if !self.admit() {
            return false;
        }

        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                self.counters.record_backend_error();
                error!(key, error = %e, "Failed to serialize cache value");
                return false;
            }
        };

        let backend = self.route().await;
        if let Err(e) = backend.set(key, serialized, options.ttl).await {
            self.absorb(&backend, "set", key, e).await;
            return false;
        }
        self.stats.lock().record_set();
        debug!(key, ttl = ?options.ttl, backend = %backend.kind(), "Cache set");

        self.register_tags(&backend, key, &options.tags).await;
        true
    }

    async fn register_tags(&self, backend: &Backend<'_>, key: &str, tags: &[String]) {
        if tags.is_empty() {
            return;
        }
        if backend.kind() == BackendKind::InProcess {
            debug!(key, "In-process backend has no tag index, tags ignored");
            return;
        }

        for tag in tags {
            if let Err(e) = backend.add_to_tag(tag, key).await {
                self.counters.record_backend_error();
                warn!(key, tag = %tag, error = %e, "Tag registration failed");
                if let Backend::Distributed(conn) = backend {
                    self.distributed.report_failure(conn, &e).await;
                }
            }
        }
    }

    // == Delete ==
    /// Removes `key`. Returns true only if a key was actually removed.
    pub async fn delete(&self, key: &str) -> bool {
        if !self.admit() {
            return false;
        }

        let backend = self.route().await;
        match backend.delete(key).await {
            Ok(removed) => {
                if removed {
                    self.stats.lock().record_delete();
                }
                removed
            }
            Err(e) => {
                self.absorb(&backend, "delete", key, e).await;
                false
            }
        }
    }

    // == Delete Pattern ==
    /// Deletes every key matching the glob `pattern`. Distributed only; 0 otherwise.
    pub async fn delete_pattern(&self, pattern: &str) -> u64 {
        if !self.admit() {
            return 0;
        }

        let backend = self.route().await;
        match backend.delete_pattern(pattern).await {
            Ok(deleted) => {
                info!(pattern, deleted, "Cache pattern delete");
                deleted
            }
            Err(e) => {
                self.absorb(&backend, "delete_pattern", pattern, e).await;
                0
            }
        }
    }

    // == Has ==
    /// True if a live value exists for `key`. Does not touch statistics.
    pub async fn has(&self, key: &str) -> bool {
        if !self.admit() {
            return false;
        }

        let backend = self.route().await;
        match backend.has(key).await {
            Ok(found) => found,
            Err(e) => {
                self.absorb(&backend, "has", key, e).await;
                false
            }
        }
    }

    // == Get Or Set ==
    /// Returns the cached value, or computes, stores and returns it.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, compute: F, options: &SetOptions) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return cached;
        }

        let value = compute().await;
        self.set(key, &value, options).await;
        value
    }

    /// Like [`get_or_set`](Self::get_or_set) for fallible computations.
    ///
    /// The computation's error is returned as-is and nothing is cached.
    pub async fn try_get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
        options: &SetOptions,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = compute().await?;
        self.set(key, &value, options).await;
        Ok(value)
    }

    // == Batch ==
    /// Reads several keys concurrently, preserving order.
    pub async fn mget<T, K>(&self, keys: &[K]) -> Vec<Option<T>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        join_all(keys.iter().map(|key| self.get::<T>(key.as_ref()))).await
    }

    /// Writes several entries as independent concurrent sets.
    ///
    /// No atomicity across entries; returns true only if every write succeeded.
    pub async fn mset<T: Serialize>(&self, items: &[CacheItem<T>]) -> bool {
        join_all(
            items
                .iter()
                .map(|item| self.set(&item.key, &item.value, &item.options)),
        )
        .await
        .into_iter()
        .all(|written| written)
    }

    /// Bulk preload with progress logging.
    pub async fn warm_up<T: Serialize>(&self, items: &[CacheItem<T>]) {
        info!(entries = items.len(), "Cache warm-up started");
        let complete = self.mset(items).await;
        info!(entries = items.len(), complete, "Cache warm-up finished");
    }

    // == Counters ==
    /// Atomically adds `amount` to the integer at `key`. Distributed only.
    pub async fn increment(&self, key: &str, amount: i64) -> Option<i64> {
        if !self.admit() {
            return None;
        }

        let backend = self.route().await;
        match backend.incr_by(key, amount).await {
            Ok(value) => Some(value),
            Err(e) => {
                self.absorb(&backend, "increment", key, e).await;
                None
            }
        }
    }

    /// Atomically subtracts `amount` from the integer at `key`. Distributed only.
    pub async fn decrement(&self, key: &str, amount: i64) -> Option<i64> {
        self.increment(key, amount.saturating_neg()).await
    }

    // == Tags ==
    /// Deletes every key written with `tag`, then the tag index.
    ///
    /// Returns the number of keys removed; 0 without a distributed backend.
    pub async fn invalidate_by_tag(&self, tag: &str) -> u64 {
        if !self.admit() {
            return 0;
        }

        let backend = self.route().await;
        match backend.invalidate_tag(tag).await {
            Ok(removed) => {
                info!(tag, removed, "Cache tag invalidated");
                removed
            }
            Err(e) => {
                self.absorb(&backend, "invalidate_by_tag", tag, e).await;
                0
            }
        }
    }

    // == Clear ==
    /// Flushes the distributed backend if available, else the in-process store.
    pub async fn clear(&self) -> bool {
        if !self.admit() {
            return false;
        }

        let backend = self.route().await;
        match backend.clear().await {
            Ok(()) => {
                warn!(backend = %backend.kind(), "Cache cleared");
                true
            }
            Err(e) => {
                self.absorb(&backend, "clear", "*", e).await;
                false
            }
        }
    }

    // == Stats ==
    pub fn get_stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    pub fn reset_stats(&self) {
        *self.stats.lock() = CacheStats::new();
        info!("Cache statistics reset");
    }

    /// Releases the distributed connection.
    pub async fn shutdown(&self) {
        self.distributed.disconnect().await;
    }

    // == Internals ==
    /// Reads the enabled flag once for this call.
    fn admit(&self) -> bool {
        let enabled = self.is_enabled();
        if !enabled {
            self.counters.record_disabled();
        }
        enabled
    }

    async fn route(&self) -> Backend<'_> {
        match self.distributed.raw_client().await {
            Some(conn) => Backend::Distributed(conn),
            None => {
                if self.distributed.is_configured() {
                    self.counters.record_fallback();
                }
                Backend::InProcess(self.memory.as_ref())
            }
        }
    }

    async fn absorb(
        &self,
        backend: &Backend<'_>,
        operation: &'static str,
        key: &str,
        err: CacheError,
    ) {
        if let CacheError::Unsupported(_) = err {
            debug!(operation, key, backend = %backend.kind(), "Not available on this backend");
            return;
        }

        self.counters.record_backend_error();
        error!(operation, key, backend = %backend.kind(), error = %err, "Cache operation failed");
        if let Backend::Distributed(conn) = backend {
            self.distributed.report_failure(conn, &err).await;
        }
    }
}
