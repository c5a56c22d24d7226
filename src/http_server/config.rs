//! Listener settings for the catalog API
//!
//! The `http` block of the catalog configuration. The front end talks to
//! the API from its own origin, so the allow-list defaults to the local
//! dev server; an empty list opens the API to any origin.

use std::io;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Front-end origins allowed to call the API
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl HttpServerConfig {
    /// Same listener on another port (`serve --port`).
    pub fn on_port(self, port: u16) -> Self {
        Self { port, ..self }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn bind_addr(&self) -> io::Result<SocketAddr> {
        self.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bind address '{}': {}", self.socket_addr(), e),
            )
        })
    }

    /// Origins for the CORS allow-list; `None` means any origin.
    ///
    /// Entries that are not valid header values are skipped with a warning.
    pub fn allowed_origins(&self) -> Option<Vec<HeaderValue>> {
        if self.cors_origins.is_empty() {
            return None;
        }

        let origins = self
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring unusable CORS origin");
                    None
                }
            })
            .collect();
        Some(origins)
    }
}
