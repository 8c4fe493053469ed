//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is in use.
//!
//! # Tasks
//! - Expiry sweep: Removes expired in-process entries at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
