//! Install and activation.
//!
//! A worker moves `installing -> installed -> activating -> active` and never
//! backwards, except that a failed activation returns to `installed` so it can
//! be retried. Transitions are serialized on [`Worker::transition`].

use std::fmt;

use cardash_core::{Error, Partition, Request};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::worker::Worker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Installing,
    Installed,
    Activating,
    Active,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    pub(crate) state: LifecycleState,
    /// Set when a skip-wait arrives before install has finished.
    pub(crate) skip_waiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    /// Partitions removed because they belong to another version.
    pub deleted: Vec<String>,
    /// Clients newly taken under control.
    pub claimed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub precache: String,
    pub cached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
    /// Present when install proceeded straight into activation.
    pub activated: Option<ActivateReport>,
}

impl Worker {
    /// Precache the app shell and move to `installed`.
    ///
    /// Individual manifest URLs that fail are reported and skipped; install
    /// itself fails only if the precache partition cannot be opened. When
    /// skip-wait is configured or was requested before install finished,
    /// activation follows under the same transition guard.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let _guard = self.transition.lock().await;
        self.expect_state(LifecycleState::Installing).await?;

        let partition = self.db.open_partition(&self.config.precache_name).await?;
        let (cached, failed) = self.precache(&partition).await;

        tracing::info!(
            partition = partition.name(),
            cached = cached.len(),
            failed = failed.len(),
            "install complete"
        );
        let skip_waiting = {
            let mut lifecycle = self.lifecycle.write().await;
            lifecycle.state = LifecycleState::Installed;
            self.config.skip_waiting_on_install || lifecycle.skip_waiting
        };

        let activated = if skip_waiting {
            match self.activate_locked().await {
                Ok(activated) => Some(activated),
                Err(e) => {
                    tracing::warn!(error = %e, "activation after install failed");
                    None
                }
            }
        } else {
            None
        };

        Ok(InstallReport { precache: partition.name().to_string(), cached, failed, activated })
    }

    /// Remove partitions from other versions, claim open clients and move to
    /// `active`.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let _guard = self.transition.lock().await;
        self.expect_state(LifecycleState::Installed).await?;
        self.activate_locked().await
    }

    /// Activate if the worker is `installed` once the transition guard is
    /// held; any other state is left alone and yields `None`.
    pub(crate) async fn activate_if_installed(&self) -> Result<Option<ActivateReport>, Error> {
        let _guard = self.transition.lock().await;
        if self.state().await != LifecycleState::Installed {
            return Ok(None);
        }
        self.activate_locked().await.map(Some)
    }

    /// Caller holds [`Worker::transition`] and has checked for `installed`.
    async fn activate_locked(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.write().await.state = LifecycleState::Activating;

        match self.sweep_partitions().await {
            Ok(deleted) => {
                let claimed = self.clients.claim().await;
                self.lifecycle.write().await.state = LifecycleState::Active;
                tracing::info!(?deleted, claimed, "worker activated");
                Ok(ActivateReport { deleted, claimed })
            }
            Err(e) => {
                tracing::error!(error = %e, "activation failed");
                self.lifecycle.write().await.state = LifecycleState::Installed;
                Err(e)
            }
        }
    }

    async fn expect_state(&self, expected: LifecycleState) -> Result<(), Error> {
        let state = self.state().await;
        if state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState(format!("worker is {state}, expected {expected}")))
        }
    }

    async fn precache(&self, partition: &Partition) -> (Vec<String>, Vec<PrecacheFailure>) {
        let fetches = self.config.manifest.iter().map(|url| async move {
            let request = Request::get(url.as_str());
            let result = match self.network.fetch(&request).await {
                Ok(response) if response.is_ok() => partition.put(&request, &response).await,
                Ok(response) => Err(Error::Network(format!("status {}", response.status))),
                Err(e) => Err(e),
            };
            (url, result)
        });

        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for (url, result) in join_all(fetches).await {
            match result {
                Ok(()) => cached.push(url.clone()),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "failed to precache");
                    failed.push(PrecacheFailure { url: url.clone(), reason: e.to_string() });
                }
            }
        }
        (cached, failed)
    }

    async fn sweep_partitions(&self) -> Result<Vec<String>, Error> {
        let expected = self.config.expected_partitions();
        let mut deleted = Vec::new();
        for name in self.db.list_partition_names().await? {
            if expected.contains(&name.as_str()) {
                continue;
            }
            if self.db.delete_partition(&name).await? {
                tracing::info!(partition = %name, "deleted stale partition");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}
