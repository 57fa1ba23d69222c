//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent`, `cache_prefix` or `cache_version` is empty
    /// - `origin` is not an http(s) URL
    /// - an excluded domain is not a bare lowercase domain
    /// - a manifest entry is neither an absolute path nor an http(s) URL
    ///
    /// Returns `ConfigError::Missing` if the precache manifest is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.cache_prefix.trim().is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") && origin.has_host() => {}
            Ok(origin) => return Err(invalid("origin", format!("unsupported origin: {origin}"))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        }

        for domain in &self.excluded_domains {
            let bare = !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains(['/', ':', ' '])
                && domain.to_ascii_lowercase() == *domain;
            if !bare {
                return Err(invalid(
                    "excluded_domains",
                    format!("'{domain}' must be a bare lowercase domain such as spotify.com"),
                ));
            }
        }

        if self.precache_manifest.is_empty() {
            return Err(ConfigError::Missing {
                field: "precache_manifest".into(),
                hint: "list at least the app shell entry point, e.g. \"/index.html\"".into(),
            });
        }
        for entry in &self.precache_manifest {
            let ok = entry.starts_with('/') || entry.starts_with("http://") || entry.starts_with("https://");
            if !ok {
                return Err(invalid(
                    "precache_manifest",
                    format!("'{entry}' must be an absolute path or http(s) URL"),
                ));
            }
        }

        if self.tile_markers.iter().chain(&self.cdn_markers).chain(&self.api_markers).any(String::is_empty) {
            tracing::warn!("empty request marker configured; it matches every URL");
        }

        Ok(())
    }
}
