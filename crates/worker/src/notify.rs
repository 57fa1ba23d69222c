//! Push notifications and notification clicks.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use cardash_core::Error;

use crate::clients::WindowClient;
use crate::config::NotificationConfig;
use crate::lifecycle::LifecycleState;
use crate::worker::Worker;

const DEFAULT_BODY: &str = "New notification";
const TAG: &str = "cardash-notification";
const VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds, alternating on and off.
    pub vibrate: Vec<u32>,
    /// Notifications sharing a tag replace one another.
    pub tag: String,
    /// RFC 3339 timestamp.
    pub shown_at: String,
}

impl Notification {
    /// Build the notification shown for a push. An absent or blank payload
    /// gets a generic body.
    pub fn from_push(config: &NotificationConfig, payload: Option<&str>) -> Self {
        let body = payload.filter(|p| !p.trim().is_empty()).unwrap_or(DEFAULT_BODY);
        Self {
            title: config.title.clone(),
            body: body.to_string(),
            icon: config.icon.clone(),
            badge: config.icon.clone(),
            vibrate: VIBRATE_PATTERN.to_vec(),
            tag: TAG.to_string(),
            shown_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Notifications currently on display.
#[derive(Default)]
pub(crate) struct NotificationCenter {
    shown: RwLock<Vec<Notification>>,
}

impl NotificationCenter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Show `notification`, replacing any with the same tag.
    async fn show(&self, notification: Notification) {
        let mut shown = self.shown.write().await;
        shown.retain(|n| n.tag != notification.tag);
        shown.push(notification);
    }

    async fn close(&self, tag: &str) -> bool {
        let mut shown = self.shown.write().await;
        let before = shown.len();
        shown.retain(|n| n.tag != tag);
        shown.len() != before
    }

    async fn list(&self) -> Vec<Notification> {
        self.shown.read().await.clone()
    }
}

impl Worker {
    /// Handle a push event by showing a notification.
    pub async fn push(&self, payload: Option<&str>) -> Notification {
        let notification = Notification::from_push(&self.config.notification, payload);
        tracing::info!(tag = %notification.tag, "showing notification");
        self.notifications.show(notification.clone()).await;
        notification
    }

    /// Handle a click on the notification tagged `tag`: close it and bring
    /// the application root to the front.
    pub async fn notification_click(&self, tag: &str) -> Result<WindowClient, Error> {
        if !self.notifications.close(tag).await {
            return Err(Error::InvalidInput(format!("no notification with tag '{tag}'")));
        }

        let controlled = self.state().await == LifecycleState::Active;
        let window = self.clients.open_window(&self.config.root_url(), controlled).await;
        tracing::debug!(client_id = window.client_id, opened = window.opened, "notification clicked");
        Ok(window)
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.list().await
    }
}
