//! sw_fetch tool implementation.
//!
//! Routes a request through the worker exactly as an intercepted page fetch.

use cardash_core::Request;
use cardash_worker::{Classification, Outcome, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path relative to the configured origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are ever cached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional Accept header; `text/html` marks a navigation.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
    pub classification: Classification,
    pub outcome: Outcome,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let mut request = Request::new(params.method.to_ascii_uppercase(), params.url);
    if let Some(accept) = params.accept {
        request = request.with_header("Accept", accept);
    }

    let result = worker.fetch(&request).await?;
    let response = result.response;

    let output = SwFetchOutput {
        url: result.record.url,
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
        classification: result.record.classification,
        outcome: result.record.outcome,
    };
    json_result(&output)
}
