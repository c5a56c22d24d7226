//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::io;
use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::catalog_routes::catalog_routes;
use super::config::HttpServerConfig;
use super::observability_routes::observability_routes;
use super::state::AppState;
use super::submit_routes::submit_routes;

/// HTTP server for the catalog API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        let cors = match config.allowed_origins() {
            Some(origins) => cors.allow_origin(AllowOrigin::list(origins)),
            None => cors.allow_origin(Any),
        };

        Router::new()
            .merge(observability_routes(Arc::clone(&state)))
            .merge(submit_routes(Arc::clone(&state)))
            .merge(catalog_routes(state))
            .fallback(not_found_handler)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> io::Result<()> {
        let addr = self.config.bind_addr()?;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "catalog API listening");
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "api path not found" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::store::MemoryStore;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::from_store(
            Arc::new(MemoryStore::new()),
            &CatalogConfig::default(),
        ))
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = HttpServer::new(HttpServerConfig::default().on_port(8080), state());
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_permissive_cors() {
        let config = HttpServerConfig {
            cors_origins: Vec::new(),
            ..HttpServerConfig::default()
        };
        let _router = HttpServer::new(config, state()).router();
    }
}
