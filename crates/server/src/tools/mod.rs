//! MCP tool implementations.
//!
//! Each tool takes the shared worker and its parameters and returns the result
//! as pretty-printed JSON text.

pub mod cache;
pub mod client;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod notify;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::{CacheListParams, list_impl};
pub use client::{SwClientParams, client_impl};
pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{SwLifecycleParams, lifecycle_impl};
pub use message::{SwMessageParams, message_impl};
pub use notify::{SwNotificationClickParams, SwPushParams, click_impl, push_impl};

fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
