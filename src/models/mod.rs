//! Request and Response models for the signed URL API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{BulkPathsRequest, PathQuery};
pub use responses::{
    BulkResolveResponse, BulkUrl, CacheStatistics, CacheSummary, ClearResponse, EntryView,
    ErrorResponse, HealthResponse, InvalidateResponse, RefreshRunResponse, ResolveResponse,
    StatisticsResponse,
};
