//! Backend Dispatch Module
//!
//! The two storage backends behind one capability contract. Every backend
//! supports get/set/delete/has/clear; pattern deletion, tags and counters exist
//! only on the distributed variant and report `Unsupported` elsewhere.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::remote::RemoteConnection;
use crate::cache::MemoryStore;
use crate::error::{CacheError, Result};

/// Namespace of tag index sets in the distributed backend.
pub const TAG_PREFIX: &str = "tag:";

/// Key of the set indexing every key written with `tag`.
pub fn tag_key(tag: &str) -> String {
    format!("{}{}", TAG_PREFIX, tag)
}

// == Backend Kind ==
/// Which backend served, or would serve, a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendKind {
    #[serde(rename = "distributed")]
    Distributed,
    #[serde(rename = "in-process")]
    InProcess,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Distributed => "distributed",
            BackendKind::InProcess => "in-process",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Backend ==
/// The backend selected for a single call.
pub enum Backend<'a> {
    Distributed(Arc<dyn RemoteConnection>),
    InProcess(&'a RwLock<MemoryStore>),
}

impl Backend<'_> {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Distributed(_) => BackendKind::Distributed,
            Backend::InProcess(_) => BackendKind::InProcess,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Backend::Distributed(conn) => conn.get(key).await,
            Backend::InProcess(store) => Ok(store.write().await.get(key)),
        }
    }

    pub async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> Result<()> {
        match self {
            Backend::Distributed(conn) => conn.set(key, &value, ttl_seconds).await,
            Backend::InProcess(store) => {
                store.write().await.set(key.to_string(), value, ttl_seconds);
                Ok(())
            }
        }
    }

    /// Returns true when a key was actually removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        match self {
            Backend::Distributed(conn) => Ok(conn.del(&[key.to_string()]).await? > 0),
            Backend::InProcess(store) => Ok(store.write().await.delete(key)),
        }
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        match self {
            Backend::Distributed(conn) => conn.exists(key).await,
            Backend::InProcess(store) => Ok(store.write().await.has(key)),
        }
    }

    /// Distributed: FLUSHALL, every key on the server. In-process: drop all entries.
    pub async fn clear(&self) -> Result<()> {
        match self {
            Backend::Distributed(conn) => conn.flush_all().await,
            Backend::InProcess(store) => {
                store.write().await.clear();
                Ok(())
            }
        }
    }

    pub async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        match self {
            Backend::Distributed(conn) => {
                let keys = conn.keys(pattern).await?;
                conn.del(&keys).await
            }
            Backend::InProcess(_) => Err(CacheError::Unsupported("delete_pattern")),
        }
    }

    /// Adds `key` to the index set of `tag`.
    pub async fn add_to_tag(&self, tag: &str, key: &str) -> Result<()> {
        match self {
            Backend::Distributed(conn) => conn.sadd(&tag_key(tag), key).await,
            Backend::InProcess(_) => Err(CacheError::Unsupported("tags")),
        }
    }

    /// Deletes every key indexed under `tag`, then the index itself.
    ///
    /// Returns how many indexed keys were still present.
    pub async fn invalidate_tag(&self, tag: &str) -> Result<u64> {
        match self {
            Backend::Distributed(conn) => {
                let index = tag_key(tag);
                let members = conn.smembers(&index).await?;
                let removed = conn.del(&members).await?;
                conn.del(&[index]).await?;
                Ok(removed)
            }
            Backend::InProcess(_) => Err(CacheError::Unsupported("invalidate_by_tag")),
        }
    }

    pub async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        match self {
            Backend::Distributed(conn) => conn.incr_by(key, delta).await,
            Backend::InProcess(_) => Err(CacheError::Unsupported("counters")),
        }
    }
}
