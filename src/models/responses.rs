//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{BackendKind, CacheStats, CountersSnapshot, MemoryStats};

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Hit/miss/set/delete counters and hit rate
    pub stats: CacheStats,
    /// Distributed backend memory usage, null when unavailable
    pub memory: Option<MemoryStats>,
    /// Backend currently serving calls
    pub backend: BackendKind,
    /// Backend failure and fallback counters
    pub counters: CountersSnapshot,
    /// Administrative switch state
    pub enabled: bool,
}

/// Number of keys removed, or the `"all"` sentinel for a full clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Deleted {
    Count(u64),
    All(&'static str),
}

impl Deleted {
    pub fn all() -> Self {
        Deleted::All("all")
    }
}

/// Response body for the clear endpoint (POST /cache/clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub deleted: Deleted,
}

impl ClearResponse {
    pub fn count(count: u64) -> Self {
        Self {
            deleted: Deleted::Count(count),
        }
    }

    pub fn all() -> Self {
        Self {
            deleted: Deleted::all(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when a configured distributed backend is unreachable
    pub status: String,
    /// Backend currently serving calls
    pub backend: BackendKind,
    /// Distributed ping result, null when no distributed backend is configured
    pub distributed_ping: Option<bool>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Builds a health report with the current timestamp.
    pub fn new(backend: BackendKind, distributed_ping: Option<bool>) -> Self {
        let status = match distributed_ping {
            Some(false) => "degraded",
            _ => "healthy",
        };
        Self {
            status: status.to_string(),
            backend,
            distributed_ping,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
