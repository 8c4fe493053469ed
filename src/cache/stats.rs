//! Cache Statistics Module
//!
//! Tracks hit/miss/set/delete counters and backend health counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Running cache performance metrics for the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of `get` calls that returned a value
    pub hits: u64,
    /// Number of `get` calls that returned nothing (absent, expired or failed)
    pub misses: u64,
    /// Number of successful writes
    pub sets: u64,
    /// Number of successful deletes
    pub deletes: u64,
    /// Percentage of gets that hit, 0 when nothing has been observed
    pub hit_rate: f64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter and refreshes the hit rate.
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.refresh_hit_rate();
    }

    // == Record Miss ==
    /// Increments the miss counter and refreshes the hit rate.
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.refresh_hit_rate();
    }

    /// Increments the set counter.
    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Increments the delete counter.
    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    fn refresh_hit_rate(&mut self) {
        let total = self.hits + self.misses;
        self.hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        };
    }
}

// == Backend Counters ==
/// Failure-mode counters, so degraded operation is visible without reading logs.
#[derive(Debug, Default)]
pub struct BackendCounters {
    backend_errors: AtomicU64,
    fallback_routes: AtomicU64,
    disabled_short_circuits: AtomicU64,
}

/// Point-in-time copy of [`BackendCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    /// Backend operations that failed and were absorbed
    pub backend_errors: u64,
    /// Calls routed to the in-process store while a distributed URL is configured
    pub fallback_routes: u64,
    /// Calls skipped because caching was administratively disabled
    pub disabled_short_circuits: u64,
}

impl BackendCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_backend_error(&self) {
        self.backend_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_routes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disabled(&self) {
        self.disabled_short_circuits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
            fallback_routes: self.fallback_routes.load(Ordering::Relaxed),
            disabled_short_circuits: self.disabled_short_circuits.load(Ordering::Relaxed),
        }
    }
}
