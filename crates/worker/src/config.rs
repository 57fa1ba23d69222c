//! Explicit worker configuration.
//!
//! Everything the worker needs to know about partitions, the precache
//! manifest and exclusion rules is passed in here at construction.

use cardash_core::{AppConfig, Error};
use url::Url;

use crate::classify::ExclusionRules;
use crate::fetch::{parse_origin, resolve};

/// Presentation of push notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub precache_name: String,
    pub runtime_name: String,
    /// App-shell URLs, already resolved against `origin`.
    pub manifest: Vec<String>,
    pub rules: ExclusionRules,
    pub skip_waiting_on_install: bool,
    pub notification: NotificationConfig,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let manifest = config
            .precache_manifest
            .iter()
            .map(|entry| resolve(&origin, entry).map(String::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            origin,
            precache_name: config.precache_name(),
            runtime_name: config.runtime_name(),
            manifest,
            rules: ExclusionRules::from(config),
            skip_waiting_on_install: config.skip_waiting_on_install,
            notification: NotificationConfig {
                title: config.notification_title.clone(),
                icon: config.notification_icon.clone(),
            },
        })
    }

    /// Partitions that survive activation.
    pub fn expected_partitions(&self) -> [&str; 2] {
        [&self.precache_name, &self.runtime_name]
    }

    /// Absolute URL of the application root, opened on notification click.
    pub fn root_url(&self) -> String {
        self.origin.join("/").map(String::from).unwrap_or_else(|_| self.origin.to_string())
    }
}
