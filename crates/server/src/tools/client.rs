//! sw_client tool implementation.
//!
//! Opens or closes a client page. A page connected before activation is
//! uncontrolled until activation claims it.

use cardash_worker::{Client, ClientId, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClientAction {
    /// Open a page at `url`.
    Connect,
    /// Close the page with `client_id`.
    Disconnect,
}

/// Parameters for the sw_client tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwClientParams {
    pub action: ClientAction,

    /// Page URL, absolute or relative to the origin. Required for connect.
    #[serde(default)]
    pub url: Option<String>,

    /// Client to close. Required for disconnect.
    #[serde(default)]
    pub client_id: Option<ClientId>,
}

/// Output from the sw_client tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwClientOutput {
    pub client_id: ClientId,
    /// Set by connect: whether the new page is already controlled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controlled: Option<bool>,
    /// Set by disconnect: whether the client was known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    pub clients: Vec<Client>,
}

/// Implementation of the sw_client tool.
pub async fn client_impl(worker: &Worker, params: SwClientParams) -> Result<CallToolResult, McpError> {
    let (client_id, controlled, removed) = match params.action {
        ClientAction::Connect => {
            let url = params
                .url
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| ToolError::InvalidInput("url is required to connect".into()))?;
            let id = worker.connect_client(&url).await?;
            (id, Some(worker.clients().is_controlled(id).await), None)
        }
        ClientAction::Disconnect => {
            let id = params
                .client_id
                .ok_or_else(|| ToolError::InvalidInput("client_id is required to disconnect".into()))?;
            (id, None, Some(worker.disconnect_client(id).await))
        }
    };

    let output = SwClientOutput { client_id, controlled, removed, clients: worker.clients().list().await };
    json_result(&output)
}
