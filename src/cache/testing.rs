//! In-memory stand-in for the distributed backend, used by unit tests.
//!
//! Honours key expiry on the tokio clock so TTL tests can run with paused time.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::cache::entry::expiry_after;
use crate::cache::remote::{Connector, RemoteConnection};
use crate::error::{CacheError, Result};

#[derive(Default)]
struct Keyspace {
    strings: HashMap<String, (String, Option<Instant>)>,
    sets: HashMap<String, BTreeSet<String>>,
}

impl Keyspace {
    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.strings
            .retain(|_, (_, expires)| expires.map_or(true, |at| now < at));
    }
}

#[derive(Default)]
struct Inner {
    keyspace: Mutex<Keyspace>,
    down: AtomicBool,
    fail_tags: AtomicBool,
    info: Mutex<String>,
}

/// Shared fake keyspace. Clones see the same data.
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    inner: Arc<Inner>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info(self, text: &str) -> Self {
        *self.inner.info.lock() = text.to_string();
        self
    }

    /// While down, every command fails with a connection error.
    pub fn set_down(&self, down: bool) {
        self.inner.down.store(down, Ordering::SeqCst);
    }

    /// Makes tag-set writes fail with a command error.
    pub fn fail_tag_writes(&self, fail: bool) {
        self.inner.fail_tags.store(fail, Ordering::SeqCst);
    }

    /// Number of live keys of any type.
    pub fn key_count(&self) -> usize {
        let mut keyspace = self.inner.keyspace.lock();
        keyspace.purge_expired();
        keyspace.strings.len() + keyspace.sets.len()
    }

    fn check(&self) -> Result<()> {
        if self.inner.down.load(Ordering::SeqCst) {
            Err(CacheError::Connection("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_keyspace<T>(&self, f: impl FnOnce(&mut Keyspace) -> Result<T>) -> Result<T> {
        self.check()?;
        let mut keyspace = self.inner.keyspace.lock();
        keyspace.purge_expired();
        f(&mut keyspace)
    }
}

#[async_trait]
impl RemoteConnection for InMemoryRemote {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_keyspace(|ks| Ok(ks.strings.get(key).map(|(value, _)| value.clone())))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let expires = ttl_seconds.and_then(expiry_after);
        self.with_keyspace(|ks| {
            ks.sets.remove(key);
            ks.strings.insert(key.to_string(), (value.to_string(), expires));
            Ok(())
        })
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        self.with_keyspace(|ks| {
            Ok(keys
                .iter()
                .filter(|key| ks.strings.remove(*key).is_some() | ks.sets.remove(*key).is_some())
                .count() as u64)
        })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.with_keyspace(|ks| Ok(ks.strings.contains_key(key) || ks.sets.contains_key(key)))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.with_keyspace(|ks| {
            let mut found: Vec<String> = ks
                .strings
                .keys()
                .chain(ks.sets.keys())
                .filter(|key| glob_match(pattern, key))
                .cloned()
                .collect();
            found.sort();
            Ok(found)
        })
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<()> {
        if self.inner.fail_tags.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("OOM command not allowed".to_string()));
        }
        self.with_keyspace(|ks| {
            ks.sets
                .entry(set.to_string())
                .or_default()
                .insert(member.to_string());
            Ok(())
        })
    }

    async fn smembers(&self, set: &str) -> Result<Vec<String>> {
        self.with_keyspace(|ks| {
            Ok(ks
                .sets
                .get(set)
                .map(|members| members.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.with_keyspace(|ks| {
            let entry = ks
                .strings
                .entry(key.to_string())
                .or_insert_with(|| ("0".to_string(), None));
            let current: i64 = entry.0.parse().map_err(|_| {
                CacheError::Backend("ERR value is not an integer or out of range".to_string())
            })?;
            let next = current + delta;
            entry.0 = next.to_string();
            Ok(next)
        })
    }

    async fn info(&self, _section: &str) -> Result<String> {
        self.check()?;
        Ok(self.inner.info.lock().clone())
    }

    async fn flush_all(&self) -> Result<()> {
        self.with_keyspace(|ks| {
            ks.strings.clear();
            ks.sets.clear();
            Ok(())
        })
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

/// Glob matching limited to `*` and `?`, which is all the cache uses.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// Observable count of connect attempts.
#[derive(Clone, Default)]
pub struct AttemptCounter(Arc<AtomicU32>);

impl AttemptCounter {
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Connector handing out the shared [`InMemoryRemote`].
pub struct FakeConnector {
    remote: InMemoryRemote,
    attempts: AttemptCounter,
    failures_left: AtomicU32,
}

impl FakeConnector {
    pub fn new(remote: InMemoryRemote) -> Self {
        Self {
            remote,
            attempts: AttemptCounter::default(),
            failures_left: AtomicU32::new(0),
        }
    }

    /// Refuses the first `count` connect attempts.
    pub fn failing_first(self, count: u32) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn attempts(&self) -> AttemptCounter {
        self.attempts.clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Arc<dyn RemoteConnection>> {
        self.attempts.0.fetch_add(1, Ordering::SeqCst);

        let refused = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(CacheError::Connection("connection refused".to_string()));
        }

        self.remote.check()?;
        Ok(Arc::new(self.remote.clone()))
    }

    fn describe(&self) -> String {
        "memory://fake".to_string()
    }
}

mod tests {
    use super::glob_match;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("user:*", "user:1"));
        assert!(glob_match("user:*", "user:"));
        assert!(!glob_match("user:*", "product:1"));
        assert!(glob_match("*:1", "order:1"));
        assert!(glob_match("order:?", "order:7"));
        assert!(!glob_match("order:?", "order:77"));
        assert!(glob_match("*", "anything"));
    }
}
