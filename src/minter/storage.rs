//! Storage provider minter
//!
//! Requests signed URLs from a Supabase-compatible object storage REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Minter;
use crate::error::{CacheError, Result};

/// Request timeout applied by the HTTP client itself
const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: Option<String>,
}

/// Minter backed by the storage provider's `object/sign` endpoint.
pub struct StorageMinter {
    http: HttpClient,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl StorageMinter {
    /// Creates a minter for `bucket` at `base_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| CacheError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            service_key: service_key.into(),
        })
    }

    fn sign_endpoint(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url,
            self.bucket,
            storage_path.trim_start_matches('/')
        )
    }

    /// The provider answers with a path relative to `/storage/v1`.
    fn absolute_url(&self, signed_path: &str) -> String {
        if signed_path.starts_with("http://") || signed_path.starts_with("https://") {
            return signed_path.to_string();
        }
        format!("{}/storage/v1{}", self.base_url, signed_path)
    }
}

#[async_trait]
impl Minter for StorageMinter {
    async fn mint(&self, storage_path: &str, ttl_seconds: i64) -> Result<String> {
        let response = self
            .http
            .post(self.sign_endpoint(storage_path))
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("apikey", &self.service_key)
            .json(&SignRequest {
                expires_in: ttl_seconds,
            })
            .send()
            .await
            .map_err(|e| CacheError::Mint(format!("{}: {}", storage_path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CacheError::Mint(format!(
                "{}: provider returned {}: {}",
                storage_path, status, body
            )));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| CacheError::Mint(format!("{}: invalid response: {}", storage_path, e)))?;

        match body.signed_url {
            Some(signed) if !signed.trim().is_empty() => {
                debug!(path = storage_path, ttl_seconds, "Minted signed URL");
                Ok(self.absolute_url(&signed))
            }
            _ => Err(CacheError::Mint(format!(
                "{}: response carried no signed URL",
                storage_path
            ))),
        }
    }
}
