//! Distributed Store Adapter
//!
//! Resilient connection management for the distributed backend: lazy connect,
//! bounded retry with backoff, availability tracking and operational
//! introspection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::remote::{Connector, RedisConnector, RemoteConnection};
use crate::config::Config;
use crate::error::CacheError;

// == Retry Policy ==
/// Reconnect bound and linear, capped backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Delay added per retry
    pub backoff_step: Duration,
    /// Upper bound on a single delay
    pub backoff_cap: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `min(attempt * step, cap)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_step
            .saturating_mul(attempt)
            .min(self.backoff_cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step: Duration::from_millis(50),
            backoff_cap: Duration::from_millis(2_000),
        }
    }
}

// == Memory Stats ==
/// Memory figures reported by the distributed backend, human-readable as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub used: String,
    pub peak: String,
    pub fragmentation_ratio: String,
}

impl MemoryStats {
    /// Extracts the three memory fields from `INFO memory` output.
    ///
    /// Returns None when the text carries no `used_memory_human` field.
    pub fn from_info(text: &str) -> Option<Self> {
        let table = parse_info(text);
        let field = |name: &str| table.get(name).cloned();

        Some(Self {
            used: field("used_memory_human")?,
            peak: field("used_memory_peak_human").unwrap_or_else(|| "unknown".to_string()),
            fragmentation_ratio: field("mem_fragmentation_ratio")
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

/// Flattens server INFO text into a key/value table, skipping section headers.
pub fn parse_info(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

// == Connection State ==
enum ConnectionState {
    /// No URL configured, or disconnected on shutdown
    Disabled,
    /// Not connected yet, or the last connection dropped
    Idle,
    Connected(Arc<dyn RemoteConnection>),
    /// Retry bound hit; stays here for the adapter's lifetime
    Exhausted,
}

// == Distributed Store ==
/// Wrapper around the distributed backend connection.
///
/// One instance per process, shared by `Arc`. Operations are never queued
/// while disconnected; callers get `None` and fall back.
pub struct DistributedStore {
    connector: Option<Box<dyn Connector>>,
    retry: RetryPolicy,
    state: Mutex<ConnectionState>,
    available: AtomicBool,
}

impl DistributedStore {
    // == Constructors ==
    /// Creates an adapter that connects through `connector` on first use.
    pub fn new(connector: Box<dyn Connector>, retry: RetryPolicy) -> Self {
        Self {
            connector: Some(connector),
            retry,
            state: Mutex::new(ConnectionState::Idle),
            available: AtomicBool::new(false),
        }
    }

    /// Creates a permanently unavailable adapter that never attempts to connect.
    pub fn disabled() -> Self {
        Self {
            connector: None,
            retry: RetryPolicy::default(),
            state: Mutex::new(ConnectionState::Disabled),
            available: AtomicBool::new(false),
        }
    }

    /// Builds the adapter from configuration. No URL means cache-disabled mode.
    pub fn from_config(config: &Config) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!("No REDIS_URL configured, distributed cache disabled");
            return Self::disabled();
        };

        match RedisConnector::new(url, config.command_timeout()) {
            Ok(connector) => {
                let retry = RetryPolicy {
                    max_retries: config.max_retries,
                    ..RetryPolicy::default()
                };
                Self::new(Box::new(connector), retry)
            }
            Err(e) => {
                error!(error = %e, "Invalid REDIS_URL, distributed cache disabled");
                Self::disabled()
            }
        }
    }

    // == Availability ==
    /// True only while a confirmed live connection exists.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// True when a connection target is configured at all.
    pub fn is_configured(&self) -> bool {
        self.connector.is_some()
    }

    // == Raw Client ==
    /// Returns the live connection, connecting lazily on first use.
    ///
    /// Concurrent first callers share one connect cycle. Returns None when
    /// disabled, disconnected or after the retry bound was exhausted.
    pub async fn raw_client(&self) -> Option<Arc<dyn RemoteConnection>> {
        let connector = self.connector.as_deref()?;
        let mut state = self.state.lock().await;

        match &*state {
            ConnectionState::Connected(conn) => Some(Arc::clone(conn)),
            ConnectionState::Disabled | ConnectionState::Exhausted => None,
            ConnectionState::Idle => match self.connect_with_retry(connector).await {
                Some(conn) => {
                    *state = ConnectionState::Connected(Arc::clone(&conn));
                    self.available.store(true, Ordering::Release);
                    Some(conn)
                }
                None => {
                    *state = ConnectionState::Exhausted;
                    None
                }
            },
        }
    }

    async fn connect_with_retry(
        &self,
        connector: &dyn Connector,
    ) -> Option<Arc<dyn RemoteConnection>> {
        let target = connector.describe();

        for attempt in 0..=self.retry.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay_for(attempt)).await;
            }

            let outcome = match connector.connect().await {
                Ok(conn) => conn.ping().await.map(|_| conn),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(conn) => {
                    info!(backend = %target, attempt, "Distributed cache connected");
                    return Some(conn);
                }
                Err(e) => {
                    warn!(backend = %target, attempt, error = %e, "Distributed cache connect failed");
                }
            }
        }

        error!(
            backend = %target,
            retries = self.retry.max_retries,
            "Distributed cache unreachable, giving up; using in-process fallback"
        );
        None
    }

    // == Failure Reporting ==
    /// Marks the adapter unavailable if `err` means `conn` is dead.
    ///
    /// Reports against a connection that was already replaced are ignored. The next `raw_client` call starts a fresh bounded reconnect cycle.
    pub async fn report_failure(&self, conn: &Arc<dyn RemoteConnection>, err: &CacheError) {
        if !err.is_connection_error() {
            return;
        }

        let mut state = self.state.lock().await;
        if let ConnectionState::Connected(current) = &*state {
            if Arc::ptr_eq(current, conn) {
                warn!(error = %err, "Distributed cache connection lost");
                *state = ConnectionState::Idle;
                self.available.store(false, Ordering::Release);
            }
        }
    }

    // == Ping ==
    /// Liveness probe. Never errors; any failure reads as false.
    pub async fn ping(&self) -> bool {
        let Some(conn) = self.raw_client().await else {
            return false;
        };

        match conn.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Distributed cache ping failed");
                self.report_failure(&conn, &e).await;
                false
            }
        }
    }

    // == Memory Stats ==
    /// Reads backend memory usage, or None if it cannot be fetched.
    pub async fn memory_stats(&self) -> Option<MemoryStats> {
        let conn = self.raw_client().await?;

        match conn.info("memory").await {
            Ok(text) => MemoryStats::from_info(&text),
            Err(e) => {
                warn!(error = %e, "Failed to read distributed cache memory info");
                self.report_failure(&conn, &e).await;
                None
            }
        }
    }

    // == Flush All ==
    /// Deletes every key the backend holds, not only this application's.
    pub async fn flush_all(&self) -> bool {
        let Some(conn) = self.raw_client().await else {
            return false;
        };

        match conn.flush_all().await {
            Ok(()) => {
                warn!("Distributed cache flushed");
                true
            }
            Err(e) => {
                error!(error = %e, "Distributed cache flush failed");
                self.report_failure(&conn, &e).await;
                false
            }
        }
    }

    // == Disconnect ==
    /// Drops the connection. Idempotent; the adapter stays unavailable afterwards.
    pub async fn disconnect(&self) {
        self.available.store(false, Ordering::Release);
        let mut state = self.state.lock().await;
        if let ConnectionState::Connected(_) = &*state {
            info!("Distributed cache disconnected");
        }
        *state = ConnectionState::Disabled;
    }
}

impl Default for DistributedStore {
    fn default() -> Self {
        Self::disabled()
    }
}
