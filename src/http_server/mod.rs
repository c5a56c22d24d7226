//! # Catalog HTTP Server Module
//!
//! Combines the write endpoint and the read endpoints into one Axum
//! router.
//!
//! # Endpoints
//!
//! - `/`, `/health` - Banner, health check and cache statistics
//! - `POST /submit` - Write path (shared secret required)
//! - `/latest`, `/popular`, `/search`, `/manga/:slug`, ... - Read views

pub mod catalog_routes;
pub mod config;
pub mod observability_routes;
pub mod server;
pub mod state;
pub mod submit_routes;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use state::AppState;
