//! Error types for the signed URL cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the signed URL cache.
///
/// Store operations never fail; these cover minting, the refresh job
/// and the HTTP surface around them.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The minter errored or returned no usable URL
    #[error("Mint failed: {0}")]
    Mint(String),

    /// The minter did not answer within the configured timeout
    #[error("Mint timed out for path: {0}")]
    MintTimeout(String),

    /// Another refresh run is still in flight
    #[error("A refresh run is already in progress")]
    RefreshInProgress,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or wrong bearer secret
    #[error("Unauthorized")]
    Unauthorized,

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Mint(_) => StatusCode::BAD_GATEWAY,
            CacheError::MintTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::RefreshInProgress => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Unauthorized => StatusCode::UNAUTHORIZED,
            CacheError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the signed URL cache.
pub type Result<T> = std::result::Result<T, CacheError>;
