//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::tasks::{RefreshConfig, DEFAULT_BATCH_SIZE};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for URLs minted on a cache miss
    pub default_ttl: i64,
    /// Seconds between scheduled refresh runs
    pub refresh_interval: u64,
    /// Mints issued concurrently per refresh batch
    pub refresh_batch_size: usize,
    /// Per-mint timeout in seconds
    pub mint_timeout: u64,
    /// Bearer secret guarding the admin endpoints, if any
    pub cron_secret: Option<String>,
    /// Storage provider base URL
    pub storage_url: Option<String>,
    /// Storage bucket holding the signed objects
    pub storage_bucket: String,
    /// Storage provider API key
    pub storage_service_key: Option<String>,
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - TTL in seconds for minted URLs (default: 3600)
    /// - `REFRESH_INTERVAL` - Refresh frequency in seconds (default: 300)
    /// - `REFRESH_BATCH_SIZE` - Concurrent mints per batch (default: 10)
    /// - `MINT_TIMEOUT` - Per-mint timeout in seconds (default: 10)
    /// - `CRON_SECRET` - Bearer secret for admin endpoints (default: unset)
    /// - `STORAGE_URL` - Storage provider base URL (default: unset)
    /// - `STORAGE_BUCKET` - Bucket name (default: media)
    /// - `STORAGE_SERVICE_KEY` - Storage provider API key (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            default_ttl: parse_env("DEFAULT_TTL", defaults.default_ttl),
            refresh_interval: parse_env("REFRESH_INTERVAL", defaults.refresh_interval),
            refresh_batch_size: parse_env("REFRESH_BATCH_SIZE", defaults.refresh_batch_size),
            mint_timeout: parse_env("MINT_TIMEOUT", defaults.mint_timeout),
            cron_secret: optional_env("CRON_SECRET"),
            storage_url: optional_env("STORAGE_URL"),
            storage_bucket: optional_env("STORAGE_BUCKET").unwrap_or(defaults.storage_bucket),
            storage_service_key: optional_env("STORAGE_SERVICE_KEY"),
        }
    }

    /// Refresh job settings derived from this configuration.
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            batch_size: self.refresh_batch_size.max(1),
            mint_timeout: self.mint_timeout(),
        }
    }

    pub fn mint_timeout(&self) -> Duration {
        Duration::from_secs(self.mint_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: 3600,
            refresh_interval: 300,
            refresh_batch_size: DEFAULT_BATCH_SIZE,
            mint_timeout: 10,
            cron_secret: None,
            storage_url: None,
            storage_bucket: "media".to_string(),
            storage_service_key: None,
        }
    }
}
