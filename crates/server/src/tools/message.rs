//! sw_message tool implementation.
//!
//! Posts a control message to the worker. Delivery is fire-and-forget, so the
//! only feedback is whether the message was recognized.

use cardash_worker::Worker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// The posted message: `"skipWaiting"`, `{"type": "SKIP_WAITING"}`,
    /// `{"type": "clearCache"}` and so on.
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    pub accepted: bool,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &Worker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let accepted = worker.receive(&params.data).await;
    json_result(&SwMessageOutput { accepted })
}
