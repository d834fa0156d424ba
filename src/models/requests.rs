//! Request DTOs for the signed URL API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Maximum accepted storage path length in bytes
pub const MAX_PATH_LENGTH: usize = 1024;

/// Maximum number of paths in one bulk request
pub const MAX_BULK_PATHS: usize = 500;

fn validate_path(path: &str) -> Option<String> {
    if path.trim().is_empty() {
        return Some("Path cannot be empty".to_string());
    }
    if path.len() > MAX_PATH_LENGTH {
        return Some(format!(
            "Path exceeds maximum length of {} bytes",
            MAX_PATH_LENGTH
        ));
    }
    None
}

/// Query for the signed URL endpoints (`?path=...`)
#[derive(Debug, Clone, Deserialize)]
pub struct PathQuery {
    /// Storage path, e.g. `renders/comics/user_id/file.png`
    #[serde(default)]
    pub path: String,
}

impl PathQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_path(&self.path)
    }
}

/// Request body for `POST /signed-urls`
#[derive(Debug, Clone, Deserialize)]
pub struct BulkPathsRequest {
    pub paths: Vec<String>,
}

impl BulkPathsRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.paths.is_empty() {
            return Some("Paths cannot be empty".to_string());
        }
        if self.paths.len() > MAX_BULK_PATHS {
            return Some(format!(
                "At most {} paths per request",
                MAX_BULK_PATHS
            ));
        }
        self.paths.iter().find_map(|path| validate_path(path))
    }
}
