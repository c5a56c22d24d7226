//! Submit HTTP Route
//!
//! `POST /submit` with the shared secret in `x-submit-secret`. The secret
//! is checked before the body is even parsed.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::state::AppState;
use crate::errors::CatalogError;
use crate::pipeline::SubmitReceipt;

pub const SECRET_HEADER: &str = "x-submit-secret";

/// Structured failure body for writes.
#[derive(Debug, Serialize)]
pub struct SubmitErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl SubmitErrorResponse {
    pub fn from_error(err: &CatalogError) -> Self {
        Self {
            ok: false,
            error: err.to_string(),
            code: err.code(),
            step: err.step().map(|s| s.as_str()),
            branch: err.orphaned_branch().map(str::to_string),
        }
    }
}

type SubmitFailure = (StatusCode, Json<SubmitErrorResponse>);

fn failure(err: CatalogError) -> SubmitFailure {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(SubmitErrorResponse::from_error(&err)))
}

pub fn submit_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/submit", post(submit_handler))
        .with_state(state)
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitReceipt>, SubmitFailure> {
    let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !state.accepts_secret(given) {
        warn!("submission rejected: bad or missing secret");
        return Err(failure(CatalogError::Auth));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| failure(CatalogError::invalid("body", format!("is not valid JSON: {}", e))))?;

    state.pipeline.submit(&payload).await.map(Json).map_err(failure)
}
