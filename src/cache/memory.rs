//! In-Process Store Module
//!
//! Memory-resident fallback storage with lazy TTL expiry and an explicit sweep.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Memory Store ==
/// Single-process key/value storage used when no distributed backend is reachable.
///
/// The store itself does no locking; it is shared behind a
/// `tokio::sync::RwLock` so read-check-delete on expiry stays atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a serialized value, replacing any existing entry for `key`.
    ///
    /// With no TTL the entry lives until deleted, cleared or the process exits.
    pub fn set(&mut self, key: String, value: String, ttl_seconds: Option<u64>) {
        self.entries.insert(key, CacheEntry::new(value, ttl_seconds));
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed as a side effect and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if self.evict_if_expired(key) {
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Has ==
    /// Returns true if a live entry exists for `key`. Same lazy expiry as `get`.
    pub fn has(&mut self, key: &str) -> bool {
        !self.evict_if_expired(key) && self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry by key, returning whether a live entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `key` if it has expired. Returns true when an entry was dropped.
    fn evict_if_expired(&mut self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired());
        if expired {
            self.entries.remove(key);
        }
        expired
    }
}
