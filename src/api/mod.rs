//! API Module
//!
//! HTTP handlers and routing around the signed URL cache.
//!
//! # Endpoints
//! - `GET /signed-url?path=` - Resolve a signed URL through the cache
//! - `DELETE /signed-url?path=` - Invalidate one cached URL
//! - `POST /signed-urls` - Bulk resolve
//! - `POST /jobs/refresh-urls` - Trigger a refresh run
//! - `GET /jobs/refresh-urls` - Cache statistics
//! - `GET /cache/entries` - Diagnostic entry dump
//! - `DELETE /cache` - Hard reset
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
