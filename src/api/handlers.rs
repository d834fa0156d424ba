//! API Handlers
//!
//! HTTP request handlers for the signed URL endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use tracing::info;

use crate::cache::{shared, MetricsCollector, SharedStore, SignedUrlStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::minter::Minter;
use crate::models::{
    BulkPathsRequest, BulkResolveResponse, CacheSummary, ClearResponse, EntryView, HealthResponse, InvalidateResponse, PathQuery,
    RefreshRunResponse, ResolveResponse, StatisticsResponse,
};
use crate::resolver::SignedUrlResolver;
use crate::tasks::RefreshJob;

/// Application state shared across all handlers.
///
/// One store per application; the resolver and the refresh job hold
/// handles to the same instance.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe signed URL store
    pub store: SharedStore,
    pub collector: Arc<MetricsCollector>,
    pub resolver: Arc<SignedUrlResolver>,
    pub refresh_job: Arc<RefreshJob>,
    /// Bearer secret for admin endpoints
    pub cron_secret: Option<String>,
}

impl AppState {
    /// Wires a store and a minter together according to `config`.
    pub fn new(store: SignedUrlStore, minter: Arc<dyn Minter>, config: &Config) -> Self {
        let store = shared(store);
        let collector = Arc::new(MetricsCollector::new());

        let resolver = Arc::new(SignedUrlResolver::new(
            store.clone(),
            minter.clone(),
            collector.clone(),
            config.default_ttl,
            config.mint_timeout(),
            config.refresh_batch_size,
        ));
        let refresh_job = Arc::new(RefreshJob::new(
            store.clone(),
            minter,
            collector.clone(),
            config.refresh_config(),
        ));

        Self {
            store,
            collector,
            resolver,
            refresh_job,
            cron_secret: config.cron_secret.clone(),
        }
    }

    /// Creates a new AppState with an empty store on the system clock.
    pub fn from_config(config: &Config, minter: Arc<dyn Minter>) -> Self {
        Self::new(SignedUrlStore::new(), minter, config)
    }

    /// Checks the bearer secret when one is configured.
    fn authorize(&self, headers: &HeaderMap) -> Result<()> {
        let Some(secret) = &self.cron_secret else {
            return Ok(());
        };

        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if token == secret.as_str() => Ok(()),
            _ => Err(CacheError::Unauthorized),
        }
    }
}

fn validated(query: PathQuery) -> Result<String> {
    match query.validate() {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(query.path),
    }
}

/// Handler for GET /signed-url?path=
///
/// Serves the cached URL or mints, caches and returns a new one.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ResolveResponse>> {
    let path = validated(query)?;
    let resolved = state.resolver.resolve(&path).await?;

    Ok(Json(ResolveResponse::new(path, resolved.url, resolved.cached)))
}

/// Handler for POST /signed-urls
///
/// Resolves a list of paths in one call. Paths whose mint fails come back
/// with a null URL instead of failing the whole request.
pub async fn resolve_many_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BulkPathsRequest>, JsonRejection>,
) -> Result<Json<BulkResolveResponse>> {
    let Json(request) =
        payload.map_err(|rejection| CacheError::InvalidRequest(rejection.body_text()))?;

    if let Some(error_msg) = request.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let resolutions = state.resolver.resolve_many(&request.paths).await;
    Ok(Json(BulkResolveResponse::new(resolutions)))
}

/// Handler for DELETE /signed-url?path=
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<InvalidateResponse>> {
    let path = validated(query)?;
    let deleted = state.resolver.invalidate(&path).await;

    Ok(Json(InvalidateResponse::new(path, deleted)))
}

/// Handler for POST /jobs/refresh-urls
///
/// Runs the refresh job once; meant for an external cron trigger.
pub async fn run_refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshRunResponse>> {
    state.authorize(&headers)?;

    info!("Starting signed URL refresh job on request");
    let result = state.refresh_job.run().await?;

    Ok(Json(RefreshRunResponse::new(result)))
}

/// Handler for GET /jobs/refresh-urls
///
/// Returns store counters together with the performance snapshot.
pub async fn statistics_handler(State(state): State<AppState>) -> Json<StatisticsResponse> {
    let (metrics, size, hit_rate) = {
        let store = state.store.read().await;
        (store.metrics(), store.len(), store.hit_rate())
    };

    let performance = state.collector.snapshot(hit_rate, size).await;
    Json(StatisticsResponse::new(
        CacheSummary::new(metrics, size),
        performance,
    ))
}

/// Handler for GET /cache/entries
pub async fn entries_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<EntryView>>> {
    state.authorize(&headers)?;

    let store = state.store.read().await;
    let now = store.now();
    let entries = store
        .entries()
        .into_iter()
        .map(|(path, entry)| EntryView::new(path, &entry, now))
        .collect();

    Ok(Json(entries))
}

/// Handler for DELETE /cache
///
/// Drops every entry and zeroes the store counters.
pub async fn clear_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClearResponse>> {
    state.authorize(&headers)?;

    let mut store = state.store.write().await;
    let cleared = store.len();
    store.clear();
    info!("Cleared signed URL cache ({} entries)", cleared);

    Ok(Json(ClearResponse { cleared }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
