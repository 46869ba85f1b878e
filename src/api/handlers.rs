//! API Handlers
//!
//! HTTP request handlers for each admin endpoint. None of them mutate the cache.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cache::CacheStore;
use crate::models::{EntriesResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds the same cache instance the proxy workers use.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore>,
}

impl AppState {
    /// Creates a new AppState around a shared cache.
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for GET /cache
///
/// Lists cached URIs, most recently written first.
pub async fn entries_handler(State(state): State<AppState>) -> Json<EntriesResponse> {
    Json(EntriesResponse::from_slots(state.cache.snapshot().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
