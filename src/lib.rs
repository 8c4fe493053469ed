//! Tiered Cache - A dual-backend cache service
//!
//! Uses a distributed Redis-compatible store when reachable and an in-process
//! TTL store otherwise, with tag invalidation and hit/miss statistics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheCategory, CacheService, SetOptions};
pub use config::Config;
pub use error::CacheError;
pub use tasks::spawn_sweep_task;
