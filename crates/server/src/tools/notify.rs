//! sw_push and sw_notification_click tool implementations.

use cardash_worker::Worker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push payload text, shown as the notification body.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Tag of the clicked notification.
    pub tag: String,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(worker: &Worker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.push(params.payload.as_deref()).await;
    json_result(&notification)
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl(worker: &Worker, params: SwNotificationClickParams) -> Result<CallToolResult, McpError> {
    let window = worker.notification_click(&params.tag).await?;
    json_result(&window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, worker};
    use cardash_worker::{Notification, WindowClient};

    #[tokio::test]
    async fn test_push_then_click() {
        let worker = worker("http://localhost:8080", false).await;

        let result = push_impl(&worker, SwPushParams { payload: Some("Arriving soon".into()) }).await.unwrap();
        let notification: Notification = output(&result);
        assert_eq!(notification.title, "CarDash");
        assert_eq!(notification.body, "Arriving soon");

        let params = SwNotificationClickParams { tag: notification.tag };
        let result = click_impl(&worker, params).await.unwrap();
        let window: WindowClient = output(&result);
        assert_eq!(window.url, "http://localhost:8080/");
        assert!(window.opened);
    }

    #[tokio::test]
    async fn test_click_without_notification() {
        let worker = worker("http://localhost:8080", false).await;
        let params = SwNotificationClickParams { tag: "cardash-notification".into() };
        let err = click_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
