//! catalogd - content catalog over a single JSON document in a
//! version-controlled repository
//!
//! Write path: submission intake, fresh fetch, pure merge, compare-and-swap
//! commit (direct or through a review branch).
//! Read path: TTL-bounded, conditionally revalidated document cache feeding
//! read-only catalog views.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod commit;
pub mod config;
pub mod errors;
pub mod http_server;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod submission;

pub use errors::{CatalogError, CatalogResult};
