//! Configuration Module
//!
//! Handles loading and managing cache service configuration from environment variables.

use std::env;
use std::time::Duration;

/// Cache service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Distributed backend connection URL; `None` runs the in-process store only
    pub redis_url: Option<String>,
    /// Administrative switch; when false every cache call is a no-op
    pub cache_enabled: bool,
    /// HTTP server port for the admin surface
    pub server_port: u16,
    /// In-process sweep interval in seconds
    pub sweep_interval: u64,
    /// Reconnect retries after the first failed connect attempt
    pub max_retries: u32,
    /// Optional upper bound on a single distributed command, in milliseconds
    pub command_timeout_ms: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Distributed backend URL (default: unset, in-process only)
    /// - `CACHE_ENABLED` - `true`/`false`, `1`/`0` (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expired entry sweep frequency in seconds (default: 60)
    /// - `REDIS_MAX_RETRIES` - Connect retries before giving up (default: 3)
    /// - `REDIS_COMMAND_TIMEOUT_MS` - Per-command timeout (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            redis_url: env::var("REDIS_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            cache_enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.cache_enabled),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.sweep_interval),
            max_retries: env::var("REDIS_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            command_timeout_ms: env::var("REDIS_COMMAND_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0),
        }
    }

    /// Command timeout as a `Duration`, if configured.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            cache_enabled: true,
            server_port: 3000,
            sweep_interval: 60,
            max_retries: 3,
            command_timeout_ms: None,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
