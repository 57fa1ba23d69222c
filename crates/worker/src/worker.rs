//! The worker: one per origin, shared by every request handler.
//!
//! Lifecycle transitions live in [`crate::lifecycle`], control messages in
//! [`crate::control`] and notifications in [`crate::notify`]; this module
//! owns construction and fetch routing.

use std::sync::Arc;

use cardash_core::{CacheDb, Error, Request};
use tokio::sync::{Mutex, RwLock};

use crate::clients::{ClientId, Clients};
use crate::config::WorkerConfig;
use crate::fetch::{Network, resolve};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::notify::NotificationCenter;
use crate::strategy::{FetchResult, StrategyEngine};

pub struct Worker {
    pub(crate) db: CacheDb,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) config: WorkerConfig,
    pub(crate) engine: StrategyEngine,
    pub(crate) lifecycle: RwLock<Lifecycle>,
    /// Serializes install and activate.
    pub(crate) transition: Mutex<()>,
    pub(crate) clients: Clients,
    pub(crate) notifications: NotificationCenter,
}

impl Worker {
    /// Create a worker in the `installing` state.
    pub fn new(db: CacheDb, network: Arc<dyn Network>, config: WorkerConfig) -> Self {
        let engine = StrategyEngine::new(db.clone(), network.clone(), &config);
        Self {
            db,
            network,
            config,
            engine,
            lifecycle: RwLock::new(Lifecycle::default()),
            transition: Mutex::new(()),
            clients: Clients::new(),
            notifications: NotificationCenter::new(),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheDb {
        &self.db
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.read().await.state
    }

    /// Handle an intercepted fetch.
    ///
    /// Until activation completes no worker controls the page, so requests go
    /// straight to the network and no partition is touched.
    pub async fn fetch(&self, request: &Request) -> Result<FetchResult, Error> {
        if self.state().await == LifecycleState::Active {
            self.engine.handle(request).await
        } else {
            self.engine.passthrough(request).await
        }
    }

    /// Register a client page. Pages loaded under an active worker start out
    /// controlled.
    pub async fn connect_client(&self, url: &str) -> Result<ClientId, Error> {
        let url = resolve(&self.config.origin, url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let controlled = self.state().await == LifecycleState::Active;
        Ok(self.clients.connect(url.into(), controlled).await)
    }

    /// Forget a closed client page. Returns false for an unknown id.
    pub async fn disconnect_client(&self, id: ClientId) -> bool {
        let removed = self.clients.disconnect(id).await;
        if !removed {
            tracing::debug!(client_id = id, "disconnect for unknown client");
        }
        removed
    }
}
