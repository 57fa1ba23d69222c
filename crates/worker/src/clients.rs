//! Registry of open client pages.
//!
//! A client is controlled once an active worker handles its fetches, either
//! because it loaded after activation or because activation claimed it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub type ClientId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Client {
    pub id: ClientId,
    pub url: String,
    pub controlled: bool,
    pub focused: bool,
}

/// Result of opening or focusing a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WindowClient {
    pub client_id: ClientId,
    pub url: String,
    /// False when an existing client at the same URL was focused instead.
    pub opened: bool,
}

#[derive(Default)]
struct Registry {
    next_id: ClientId,
    clients: BTreeMap<ClientId, Client>,
}

impl Registry {
    fn insert(&mut self, url: String, controlled: bool) -> ClientId {
        self.next_id += 1;
        let id = self.next_id;
        self.clients.insert(id, Client { id, url, controlled, focused: false });
        id
    }

    fn focus(&mut self, id: ClientId) {
        for client in self.clients.values_mut() {
            client.focused = client.id == id;
        }
    }
}

#[derive(Default)]
pub struct Clients {
    registry: RwLock<Registry>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self, url: String, controlled: bool) -> ClientId {
        let id = self.registry.write().await.insert(url, controlled);
        tracing::debug!(client_id = id, controlled, "client connected");
        id
    }

    pub async fn disconnect(&self, id: ClientId) -> bool {
        self.registry.write().await.clients.remove(&id).is_some()
    }

    /// Take control of every connected client. Returns how many were newly
    /// claimed.
    pub async fn claim(&self) -> usize {
        let mut registry = self.registry.write().await;
        let mut claimed = 0;
        for client in registry.clients.values_mut().filter(|c| !c.controlled) {
            client.controlled = true;
            claimed += 1;
        }
        claimed
    }

    pub async fn is_controlled(&self, id: ClientId) -> bool {
        self.registry
            .read()
            .await
            .clients
            .get(&id)
            .is_some_and(|c| c.controlled)
    }

    /// Focus the client showing `url`, or open a new one there.
    pub async fn open_window(&self, url: &str, controlled: bool) -> WindowClient {
        let mut registry = self.registry.write().await;

        let existing = registry.clients.values().find(|c| c.url == url).map(|c| c.id);
        let (client_id, opened) = match existing {
            Some(id) => (id, false),
            None => (registry.insert(url.to_string(), controlled), true),
        };
        registry.focus(client_id);

        WindowClient { client_id, url: url.to_string(), opened }
    }

    pub async fn list(&self) -> Vec<Client> {
        self.registry.read().await.clients.values().cloned().collect()
    }
}
