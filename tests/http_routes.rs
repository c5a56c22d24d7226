//! HTTP surface tests
//!
//! The full router driven with `tower::ServiceExt::oneshot` over an
//! in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use catalogd::config::CatalogConfig;
use catalogd::http_server::{AppState, HttpServer};
use catalogd::store::MemoryStore;

const SECRET: &str = "s3cret";

fn app(document: Value) -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::with_file(
        "main",
        "data.json",
        document.to_string().into_bytes(),
    ));
    let config = CatalogConfig {
        submit_secret: Some(SECRET.to_string()),
        ..CatalogConfig::default()
    };
    let state = Arc::new(AppState::from_store(store.clone(), &config));
    (store, HttpServer::build_router(&config.http, state))
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn submit_request(secret: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-submit-secret", secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn genre_catalog() -> Value {
    let series: Vec<Value> = (0..12)
        .map(|i| json!({"slug": format!("s{:02}", i), "title": format!("Series {}", i), "genres": ["Action"]}))
        .chain(std::iter::once(json!({"slug": "calm", "title": "Calm Days", "genres": ["Slice of Life"]})))
        .collect();
    json!({ "series": series, "announcements": [{"id": "n1"}] })
}

// =============================================================================
// WRITE ENDPOINT
// =============================================================================

#[tokio::test]
async fn test_submit_requires_secret() {
    let (store, router) = app(json!({"series": []}));
    let body = json!({"type": "series", "slug": "a", "data": {}});

    let (status, response) = send(router.clone(), submit_request(None, body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["ok"], false);
    assert_eq!(response["code"], "AUTH_ERROR");

    let (status, _) = send(router, submit_request(Some("nope"), body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test]
async fn test_submit_direct_series() {
    let (store, router) = app(json!({"series": [{"slug": "x"}]}));
    let (status, response) = send(
        router,
        submit_request(
            Some(SECRET),
            json!({"type": "series", "slug": "a", "mode": "direct", "data": {"title": "A"}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["ok"], true);
    assert_eq!(response["mode"], "direct");
    assert_eq!(response["path"], "data.json");
    assert_eq!(response["noop"], false);

    let stored: Value = serde_json::from_slice(&store.file("main", "data.json").unwrap()).unwrap();
    assert_eq!(stored["series"][0]["slug"], "a");
}

#[tokio::test]
async fn test_submit_chapter_without_series_is_404() {
    let (_, router) = app(json!({"series": []}));
    let (status, response) = send(
        router,
        submit_request(
            Some(SECRET),
            json!({"type": "chapter", "seriesSlug": "a", "chapterSlug": "ch-1",
                   "data": {"pages": ["u1", "u2"]}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_submit_malformed_body_is_400() {
    let (_, router) = app(json!({"series": []}));
    let request = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("x-submit-secret", SECRET)
        .body(Body::from("{not json"))
        .unwrap();

    let (status, response) = send(router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "VALIDATION_ERROR");
}

// =============================================================================
// READ ENDPOINTS
// =============================================================================

#[tokio::test]
async fn test_by_genre_second_page() {
    let (_, router) = app(genre_catalog());
    let (status, body) = get(router, "/by-genre/action?page=2&pageSize=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 12);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 5);
    let slugs: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, vec!["s05", "s06", "s07", "s08", "s09"]);
}

#[tokio::test]
async fn test_empty_search_returns_empty_list() {
    let (store, router) = app(genre_catalog());
    let (status, body) = get(router, "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test]
async fn test_search_matches_all_terms() {
    let (_, router) = app(genre_catalog());
    let (_, body) = get(router, "/search?q=calm%20life").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["slug"], "calm");
}

#[tokio::test]
async fn test_latest_and_recommendations() {
    let (_, router) = app(genre_catalog());
    let (_, latest) = get(router.clone(), "/latest?pageSize=3").await;
    assert_eq!(latest.as_array().unwrap().len(), 3);
    assert_eq!(latest[0]["badge"], "UP");

    let (_, recent) = get(router.clone(), "/recent").await;
    assert_eq!(recent.as_array().unwrap().len(), 13);

    let (_, recs) = get(router, "/recommendations").await;
    assert_eq!(recs.as_array().unwrap().len(), 13);
    assert_eq!(recs[0]["updatedAt"], Value::Null);
}

#[tokio::test]
async fn test_series_detail_and_missing_series() {
    let (_, router) = app(json!({"series": [{"slug": "a", "title": "A", "cover": "c.jpg",
        "chapters": [{"id": "a-001", "pages": ["p"]}]}]}));

    let (status, body) = get(router.clone(), "/manga/a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["banner"], "c.jpg");
    assert_eq!(body["chapters"][0]["id"], "a-001");

    let (status, _) = get(router.clone(), "/series/a").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(router, "/manga/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "series not found");
}

#[tokio::test]
async fn test_chapter_lookup() {
    let (_, router) = app(json!({"series": [{"slug": "a"}],
        "chapters": {"a": [{"id": "ch-1", "pages": ["p1", "p2"]}]}}));

    let (status, body) = get(router.clone(), "/manga/chapter/ch-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages"], json!(["p1", "p2"]));

    let (status, _) = get(router, "/chapters/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_genres_and_announcements() {
    let (_, router) = app(genre_catalog());
    let (_, genres) = get(router.clone(), "/genres").await;
    assert_eq!(genres, json!(["Action", "Slice of Life"]));

    let (_, announcements) = get(router, "/announcements").await;
    assert_eq!(announcements, json!([{"id": "n1"}]));
}

#[tokio::test]
async fn test_popular_defaults_to_daily() {
    let (_, router) = app(json!({"series": [
        {"slug": "a", "bookmarks": 1}, {"slug": "b", "bookmarks": 7}
    ]}));
    let (_, body) = get(router, "/popular").await;
    assert_eq!(body[0]["slug"], "b");
}

#[tokio::test]
async fn test_reads_share_cached_document() {
    let (store, router) = app(genre_catalog());
    get(router.clone(), "/latest").await;
    get(router.clone(), "/genres").await;
    get(router, "/popular?range=all").await;
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn test_unknown_path_falls_back() {
    let (_, router) = app(json!({"series": []}));
    let (status, body) = get(router, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "api path not found"}));
}

#[tokio::test]
async fn test_health_and_banner() {
    let (_, router) = app(json!({"series": []}));
    let (status, health) = get(router.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["cache_ttl_secs"], 10);

    let (_, banner) = get(router, "/").await;
    assert_eq!(banner["ok"], true);
    assert!(banner["docs"].as_array().unwrap().len() > 5);
}
