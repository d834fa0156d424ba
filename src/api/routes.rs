//! API Routes
//!
//! Configures the Axum router with all signed URL endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, entries_handler, health_handler, invalidate_handler, resolve_handler,
    resolve_many_handler, run_refresh_handler, statistics_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /signed-url?path=` - Cached or freshly minted signed URL
/// - `DELETE /signed-url?path=` - Drop a cached URL
/// - `POST /signed-urls` - Resolve a list of paths in one call
/// - `POST /jobs/refresh-urls` - Run the refresh job once
/// - `GET /jobs/refresh-urls` - Cache statistics
/// - `GET /cache/entries` - Diagnostic dump of cached entries
/// - `DELETE /cache` - Drop everything and zero the counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/signed-url",
            get(resolve_handler).delete(invalidate_handler),
        )
        .route("/signed-urls", post(resolve_many_handler))
        .route(
            "/jobs/refresh-urls",
            get(statistics_handler).post(run_refresh_handler),
        )
        .route("/cache/entries", get(entries_handler))
        .route("/cache", delete(clear_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
