//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::cache::CacheService;
use crate::error::{CacheError, Result};
use crate::models::{ClearRequest, ClearResponse, ClearTarget, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds the process-wide cache service.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheService>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(cache: CacheService) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(CacheService::from_config(config))
    }
}

/// Handler for GET /cache/stats
///
/// Returns statistics, backend memory usage and the active backend.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = &state.cache;

    Json(StatsResponse {
        stats: cache.get_stats(),
        memory: cache.memory_stats().await,
        backend: cache.backend_kind(),
        counters: cache.counters(),
        enabled: cache.is_enabled(),
    })
}

/// Handler for POST /cache/clear
///
/// Body `{pattern}` deletes by glob, `{tag}` invalidates a tag, `{}` clears everything.
pub async fn clear_handler(
    State(state): State<AppState>,
    Json(req): Json<ClearRequest>,
) -> Result<Json<ClearResponse>> {
    let target = req.target().map_err(CacheError::InvalidRequest)?;
    info!(clear = ?target, "Admin cache clear requested");

    let response = match target {
        ClearTarget::Pattern(pattern) => {
            ClearResponse::count(state.cache.delete_pattern(&pattern).await)
        }
        ClearTarget::Tag(tag) => ClearResponse::count(state.cache.invalidate_by_tag(&tag).await),
        ClearTarget::All => {
            if !state.cache.clear().await {
                return Err(CacheError::Internal("Cache clear failed".to_string()));
            }
            ClearResponse::all()
        }
    };

    Ok(Json(response))
}

/// Handler for GET /health
///
/// Reports the active backend and, when configured, a distributed ping.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let distributed = state.cache.distributed();
    let ping = if distributed.is_configured() {
        Some(distributed.ping().await)
    } else {
        None
    };

    Json(HealthResponse::new(state.cache.backend_kind(), ping))
}
