//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use signed_url_cache::{
    api::create_router, clock::ManualClock, AppState, CacheError, Config, Minter, Result,
    SignedUrlStore,
};
use tokio::sync::Semaphore;
use tower::ServiceExt;

// == Helper Functions ==

/// Answers `https://cdn.test/{path}?n={call}`; paths starting with `bad/` fail.
#[derive(Default)]
struct CountingMinter {
    calls: AtomicUsize,
}

#[async_trait]
impl Minter for CountingMinter {
    async fn mint(&self, storage_path: &str, _ttl_seconds: i64) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if storage_path.starts_with("bad/") {
            return Err(CacheError::Mint(format!("{}: not found", storage_path)));
        }
        Ok(format!("https://cdn.test/{}?n={}", storage_path, n))
    }
}

/// Holds every mint until a permit is released.
struct GatedMinter {
    gate: Semaphore,
    calls: AtomicUsize,
}

#[async_trait]
impl Minter for GatedMinter {
    async fn mint(&self, storage_path: &str, _ttl_seconds: i64) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| CacheError::Mint(e.to_string()))?;
        Ok(format!("https://gated.test/{}", storage_path))
    }
}

fn create_state(secret: Option<&str>) -> AppState {
    let config = Config {
        cron_secret: secret.map(str::to_string),
        ..Config::default()
    };
    AppState::new(
        SignedUrlStore::new(),
        Arc::new(CountingMinter::default()),
        &config,
    )
}

fn create_test_app() -> Router {
    create_router(create_state(None))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn send_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == Resolve Endpoint Tests ==

#[tokio::test]
async fn test_resolve_miss_then_hit() {
    let app = create_test_app();

    let (status, first) = send(&app, "GET", "/signed-url?path=renders/comics/u1/a.png", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["path"], "renders/comics/u1/a.png");
    assert_eq!(first["cached"], false);
    assert_eq!(first["url"], "https://cdn.test/renders/comics/u1/a.png?n=1");

    let (status, second) = send(&app, "GET", "/signed-url?path=renders/comics/u1/a.png", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["url"], first["url"]);
}

#[tokio::test]
async fn test_resolve_mint_failure() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/signed-url?path=bad/a.png", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("bad/a.png"));
}

#[tokio::test]
async fn test_resolve_empty_path() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/signed-url?path=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_resolve_missing_path_is_json_error() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/signed-url", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid request: Path cannot be empty");

    let (status, json) = send(&app, "DELETE", "/signed-url", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// == Bulk Resolve Endpoint Tests ==

#[tokio::test]
async fn test_bulk_resolve_mixed() {
    let app = create_test_app();

    send(&app, "GET", "/signed-url?path=a.png", None).await;

    let (status, json) = send_json(
        &app,
        "/signed-urls",
        json!({ "paths": ["a.png", "bad/b.png", "c.png"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["minted"], 1);
    assert_eq!(json["failed"], 1);

    let urls = json["urls"].as_array().unwrap();
    assert_eq!(urls[0]["path"], "a.png");
    assert_eq!(urls[0]["cached"], true);
    assert_eq!(urls[1]["url"], Value::Null);
    assert!(urls[2]["url"].as_str().unwrap().starts_with("https://cdn.test/c.png"));

    // The failed path was not cached, the minted one was
    let (_, stats) = send(&app, "GET", "/jobs/refresh-urls", None).await;
    assert_eq!(stats["statistics"]["cache"]["size"], 2);
}

#[tokio::test]
async fn test_bulk_resolve_bad_body_is_json_error() {
    let app = create_test_app();

    let (status, json) = send_json(&app, "/signed-urls", json!({ "paths": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = send_json(&app, "/signed-urls", json!({ "wrong": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// == Invalidate Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_forces_new_mint() {
    let app = create_test_app();

    send(&app, "GET", "/signed-url?path=a.png", None).await;

    let (status, json) = send(&app, "DELETE", "/signed-url?path=a.png", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], true);

    let (_, json) = send(&app, "DELETE", "/signed-url?path=a.png", None).await;
    assert_eq!(json["deleted"], false);

    let (_, json) = send(&app, "GET", "/signed-url?path=a.png", None).await;
    assert_eq!(json["cached"], false);
    assert_eq!(json["url"], "https://cdn.test/a.png?n=2");
}

// == Statistics Endpoint Tests ==

#[tokio::test]
async fn test_statistics_reflect_traffic() {
    let app = create_test_app();

    send(&app, "GET", "/signed-url?path=a.png", None).await; // miss
    send(&app, "GET", "/signed-url?path=a.png", None).await; // hit

    let (status, json) = send(&app, "GET", "/jobs/refresh-urls", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let cache = &json["statistics"]["cache"];
    assert_eq!(cache["size"], 1);
    assert_eq!(cache["hits"], 1);
    assert_eq!(cache["misses"], 1);
    assert!((cache["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);

    let performance = &json["statistics"]["performance"];
    assert_eq!(performance["total_requests"], 2);
    assert_eq!(performance["cache_size"], 1);
}

// == Refresh Endpoint Tests ==

#[tokio::test]
async fn test_refresh_run_without_secret() {
    let app = create_test_app();

    let (status, json) = send(&app, "POST", "/jobs/refresh-urls", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["result"]["refreshed"], 0);
    assert_eq!(json["result"]["failed"], 0);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_refresh_run_renews_near_expiry_entries() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let state = AppState::new(
        SignedUrlStore::with_clock(clock.clone()),
        Arc::new(CountingMinter::default()),
        &Config::default(),
    );
    {
        let mut store = state.store.write().await;
        store.set("renders/near.png", "old", 100);
        store.set("renders/far.png", "old", 3600);
    }
    // near.png has 10s of its 100s left
    clock.advance_secs(90);
    let app = create_router(state.clone());

    let (status, json) = send(&app, "POST", "/jobs/refresh-urls", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["refreshed"], 1);
    assert_eq!(json["result"]["failed"], 0);

    {
        let store = state.store.read().await;
        assert!(store
            .entry("renders/near.png")
            .unwrap()
            .url
            .starts_with("https://cdn.test/renders/near.png"));
        assert_eq!(store.entry("renders/far.png").unwrap().url, "old");
    }

    let (_, json) = send(&app, "GET", "/jobs/refresh-urls", None).await;
    assert_eq!(json["statistics"]["cache"]["refreshes"], 1);
    assert_eq!(json["statistics"]["performance"]["urls_refreshed_last_hour"], 1);
}

#[tokio::test]
async fn test_overlapping_refresh_run_is_conflict() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let minter = Arc::new(GatedMinter {
        gate: Semaphore::new(0),
        calls: AtomicUsize::new(0),
    });
    let state = AppState::new(
        SignedUrlStore::with_clock(clock.clone()),
        minter.clone(),
        &Config::default(),
    );
    state.store.write().await.set("renders/near.png", "old", 100);
    clock.advance_secs(90);
    let app = create_router(state);

    let first = tokio::spawn({
        let app = app.clone();
        async move { send(&app, "POST", "/jobs/refresh-urls", None).await }
    });
    while minter.calls.load(Ordering::SeqCst) < 1 {
        tokio::task::yield_now().await;
    }

    let (status, json) = send(&app, "POST", "/jobs/refresh-urls", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].is_string());

    minter.gate.add_permits(1);
    let (status, json) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["refreshed"], 1);
}

#[tokio::test]
async fn test_refresh_requires_secret() {
    let app = create_router(create_state(Some("cron-secret")));

    let (status, _) = send(&app, "POST", "/jobs/refresh-urls", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/jobs/refresh-urls", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(&app, "POST", "/jobs/refresh-urls", Some("cron-secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

// == Diagnostics & Reset Tests ==

#[tokio::test]
async fn test_entries_endpoint() {
    let app = create_test_app();

    send(&app, "GET", "/signed-url?path=b.png", None).await;
    send(&app, "GET", "/signed-url?path=a.png", None).await;

    let (status, json) = send(&app, "GET", "/cache/entries", None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["path"], "a.png");
    assert_eq!(entries[0]["ttl_seconds"], 3600);
    assert_eq!(entries[0]["needs_refresh"], false);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let app = create_router(create_state(Some("cron-secret")));

    send(&app, "GET", "/signed-url?path=a.png", None).await;

    let (status, _) = send(&app, "DELETE", "/cache", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(&app, "DELETE", "/cache", Some("cron-secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], 1);

    let (_, json) = send(&app, "GET", "/jobs/refresh-urls", None).await;
    assert_eq!(json["statistics"]["cache"]["size"], 0);
    assert_eq!(json["statistics"]["cache"]["misses"], 0);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}
