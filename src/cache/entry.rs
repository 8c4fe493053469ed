//! Cache Entry Module
//!
//! Defines the structure for individual in-process cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single in-process cache entry: a serialized value and its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value, already serialized
    pub value: String,
    /// Absolute expiry instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The serialized value to store
    /// * `ttl_seconds` - Optional TTL in seconds, normalized by [`normalize_ttl`]
    pub fn new(value: String, ttl_seconds: Option<u64>) -> Self {
        let expires_at = ttl_seconds.and_then(expiry_after);

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiry instant. Entries without TTL never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

}

/// Longest TTL honoured by either backend (100 years); anything above is stored without expiry.
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// Effective TTL for a requested one: at least 1 second, None past [`MAX_TTL_SECONDS`].
pub fn normalize_ttl(ttl_seconds: u64) -> Option<u64> {
    (ttl_seconds <= MAX_TTL_SECONDS).then(|| ttl_seconds.max(1))
}

/// Expiry instant for a requested TTL, or None when it is stored without expiry.
pub(crate) fn expiry_after(ttl_seconds: u64) -> Option<Instant> {
    let ttl = normalize_ttl(ttl_seconds)?;
    Instant::now().checked_add(Duration::from_secs(ttl))
}
