//! Control messages posted to the worker by client pages.
//!
//! Messages are fire-and-forget: the sender gets no reply, and failures are
//! only logged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cardash_core::Error;

use crate::lifecycle::{ActivateReport, LifecycleState};
use crate::worker::Worker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ControlMessage {
    /// Activate the installed worker without waiting for old clients to close.
    SkipWaiting,
    /// Delete every partition.
    ClearCache,
}

impl ControlMessage {
    /// Recognize a posted message.
    ///
    /// Both a bare string (`"skipWaiting"`) and an object with a `type` field
    /// (`{"type": "SKIP_WAITING"}`) are accepted. Anything else is `None`.
    pub fn parse(message: &Value) -> Option<Self> {
        let tag = match message {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map.get("type")?.as_str()?,
            _ => return None,
        };

        match tag {
            "skipWaiting" | "SKIP_WAITING" => Some(Self::SkipWaiting),
            "clearCache" | "CLEAR_CACHE" => Some(Self::ClearCache),
            _ => None,
        }
    }
}

impl Worker {
    /// Handle a raw posted message. Returns whether it was recognized;
    /// unrecognized messages are ignored.
    pub async fn receive(&self, message: &Value) -> bool {
        match ControlMessage::parse(message) {
            Some(msg) => {
                self.post_message(msg).await;
                true
            }
            None => {
                tracing::debug!(%message, "ignoring unrecognized message");
                false
            }
        }
    }

    pub async fn post_message(&self, message: ControlMessage) {
        match message {
            ControlMessage::SkipWaiting => {
                if let Err(e) = self.skip_waiting().await {
                    tracing::warn!(error = %e, "skip-wait activation failed");
                }
            }
            ControlMessage::ClearCache => match self.db.delete_all_partitions().await {
                Ok(deleted) => tracing::info!(deleted, "cleared all partitions"),
                Err(e) => tracing::warn!(error = %e, "failed to clear partitions"),
            },
        }
    }

    /// Returns the activation report when this call performed the activation.
    ///
    /// While installing, the request is recorded and install activates on
    /// completion. The flag is read by install in the same critical section
    /// that marks it `installed`, so exactly one of the two activates.
    async fn skip_waiting(&self) -> Result<Option<ActivateReport>, Error> {
        let state = {
            let mut lifecycle = self.lifecycle.write().await;
            if lifecycle.state == LifecycleState::Installing {
                lifecycle.skip_waiting = true;
            }
            lifecycle.state
        };

        match state {
            LifecycleState::Installing => {
                tracing::debug!("skip-wait recorded, activating after install");
                Ok(None)
            }
            LifecycleState::Installed => self.activate_if_installed().await,
            LifecycleState::Activating | LifecycleState::Active => {
                tracing::debug!(%state, "skip-wait has no effect");
                Ok(None)
            }
        }
    }
}
