//! Catalog HTTP Routes
//!
//! Read-only endpoints. Each handler asks the read cache for the current
//! document and returns a projection of it.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::AppState;
use crate::catalog::{self, GenrePage, PageQuery, PopularRange, SeriesCard, SeriesDetail};
use crate::model::{ChapterRecord, Document};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

#[derive(Debug, Deserialize)]
pub struct PopularParams {
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: status.as_u16(),
        }),
    )
}

// ==================
// Catalog Routes
// ==================

pub fn catalog_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/latest", get(latest_handler))
        .route("/manga/latest", get(latest_handler))
        .route("/recent", get(latest_handler))
        .route("/popular", get(popular_handler))
        .route("/recommendations", get(recommendations_handler))
        .route("/announcements", get(announcements_handler))
        .route("/manga/chapter/:id", get(chapter_handler))
        .route("/chapter/:id", get(chapter_handler))
        .route("/chapters/:id", get(chapter_handler))
        .route("/manga/:slug", get(series_handler))
        .route("/series/:slug", get(series_handler))
        .route("/search", get(search_handler))
        .route("/genres", get(genres_handler))
        .route("/by-genre/:name", get(by_genre_handler))
        .with_state(state)
}

async fn document(state: &AppState) -> Result<Arc<Document>, ApiError> {
    state.cache.get().await.map_err(|e| {
        let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        error(status, e.to_string())
    })
}

// ==================
// Handlers
// ==================

async fn latest_handler(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<SeriesCard>>, ApiError> {
    let doc = document(&state).await?;
    Ok(Json(catalog::latest(&doc, page)))
}

async fn popular_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PopularParams>,
) -> Result<Json<Vec<SeriesCard>>, ApiError> {
    let doc = document(&state).await?;
    let range = PopularRange::parse(params.range.as_deref());
    Ok(Json(catalog::popular(&doc, range)))
}

async fn recommendations_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SeriesCard>>, ApiError> {
    let doc = document(&state).await?;
    Ok(Json(catalog::recommendations(&doc)))
}

async fn announcements_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let doc = document(&state).await?;
    Ok(Json(catalog::announcements(&doc).to_vec()))
}

async fn series_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<SeriesDetail>, ApiError> {
    let doc = document(&state).await?;
    catalog::series_detail(&doc, &slug)
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "series not found"))
}

async fn chapter_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChapterRecord>, ApiError> {
    let doc = document(&state).await?;
    catalog::chapter(&doc, &id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "chapter not found"))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SeriesCard>>, ApiError> {
    if params.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let doc = document(&state).await?;
    Ok(Json(catalog::search(&doc, &params.q)))
}

async fn genres_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let doc = document(&state).await?;
    Ok(Json(catalog::genres(&doc)))
}

async fn by_genre_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<GenrePage>, ApiError> {
    let doc = document(&state).await?;
    Ok(Json(catalog::by_genre(&doc, &name, page)))
}
