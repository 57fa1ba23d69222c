//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CARDASH_SW_*)
//! 2. TOML config file (if CARDASH_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CARDASH_SW_*)
/// 2. TOML config file (if CARDASH_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite partition store.
    ///
    /// One store per application origin.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the dashboard is served from; relative request URLs and
    /// manifest entries resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes accepted per network response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Prefix shared by every partition name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag embedded in partition names. Bumping it makes the next
    /// activation drop every partition of the previous version.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// App-shell resources fetched into the precache partition on install.
    #[serde(default = "default_precache_manifest")]
    pub precache_manifest: Vec<String>,

    /// Registrable domains whose requests bypass the cache layer entirely.
    /// Matches the domain itself and its subdomains only.
    #[serde(default = "default_excluded_domains")]
    pub excluded_domains: Vec<String>,

    /// Substrings of host+path that mark a map tile.
    #[serde(default = "default_tile_markers")]
    pub tile_markers: Vec<String>,

    /// Substrings of host+path that mark a CDN asset.
    #[serde(default = "default_cdn_markers")]
    pub cdn_markers: Vec<String>,

    /// Substrings of host+path that mark an API or auth call (never cached).
    #[serde(default = "default_api_markers")]
    pub api_markers: Vec<String>,

    /// Activate a freshly installed worker without waiting for a skip-wait
    /// message.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    /// Icon and badge path for push notifications.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cardash-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "cardash-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_cache_prefix() -> String {
    "cardash".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_precache_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/maps.html",
        "/spotify.html",
        "/telegram.html",
        "/settings.html",
        "/styles.css",
        "/app.js",
        "/manifest.json",
        "/mnt/data/logotp.png",
    ]
    .map(String::from)
    .to_vec()
}

fn default_excluded_domains() -> Vec<String> {
    ["spotify.com", "telegram.org"].map(String::from).to_vec()
}

fn default_tile_markers() -> Vec<String> {
    ["tile", ".pbf", "maplibre", "demotiles"].map(String::from).to_vec()
}

fn default_cdn_markers() -> Vec<String> {
    ["unpkg.com", "cdn.jsdelivr.net", "sdk.scdn.co", "cloudflare"]
        .map(String::from)
        .to_vec()
}

fn default_api_markers() -> Vec<String> {
    ["/api/", "/auth/", "osrm", "graphhopper"].map(String::from).to_vec()
}

fn default_true() -> bool {
    true
}

fn default_notification_title() -> String {
    "CarDash".into()
}

fn default_notification_icon() -> String {
    "/mnt/data/logotp.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            precache_manifest: default_precache_manifest(),
            excluded_domains: default_excluded_domains(),
            tile_markers: default_tile_markers(),
            cdn_markers: default_cdn_markers(),
            api_markers: default_api_markers(),
            skip_waiting_on_install: true,
            notification_title: default_notification_title(),
            notification_icon: default_notification_icon(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the versioned app-shell partition, e.g. `cardash-v1`.
    pub fn precache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Name of the versioned runtime partition, e.g. `cardash-runtime-v1`.
    pub fn runtime_name(&self) -> String {
        format!("{}-runtime-{}", self.cache_prefix, self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CARDASH_SW_`
    /// 2. TOML file from `CARDASH_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CARDASH_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CARDASH_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
