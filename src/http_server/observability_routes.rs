//! Service HTTP Routes
//!
//! Banner, health check and read cache statistics.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::state::AppState;
use crate::cache::CacheStatsSnapshot;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: CacheStatsSnapshot,
    pub cache_ttl_secs: u64,
}

/// Root banner listing the read endpoints
#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub ok: bool,
    pub name: &'static str,
    pub docs: Vec<&'static str>,
}

pub const ENDPOINT_DOCS: &[&str] = &[
    "/latest?page=1",
    "/recommendations",
    "/announcements",
    "/manga/:slug",
    "/manga/chapter/:id",
    "/search?q=keyword",
    "/genres",
    "/by-genre/:name?page=1&pageSize=20",
    "/popular?range=daily|weekly|all",
    "POST /submit",
];

pub fn observability_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(banner_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn banner_handler() -> impl IntoResponse {
    Json(BannerResponse {
        ok: true,
        name: env!("CARGO_PKG_NAME"),
        docs: ENDPOINT_DOCS.to_vec(),
    })
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: state.cache.stats(),
        cache_ttl_secs: state.cache.ttl().as_secs(),
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            cache: CacheStatsSnapshot::default(),
            cache_ttl_secs: 10,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["cache"]["hits"], 0);
    }
}
