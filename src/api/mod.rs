//! API Module
//!
//! HTTP handlers and routing for the cache admin surface.
//!
//! # Endpoints
//! - `GET /cache/stats` - Statistics, memory usage and active backend
//! - `POST /cache/clear` - Delete by pattern, by tag, or everything
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
