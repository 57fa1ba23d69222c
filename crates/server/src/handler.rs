//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use crate::tools::{
    CacheListParams, SwClientParams, SwFetchParams, SwLifecycleParams, SwMessageParams, SwNotificationClickParams,
    SwPushParams, click_impl, client_impl, fetch_impl, lifecycle_impl, list_impl, message_impl, push_impl,
};

use cardash_worker::Worker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for cardash-sw.
#[derive(Clone)]
pub struct CarDashServer {
    worker: Arc<Worker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl CarDashServer {
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Fetch a URL through the offline worker. Returns the response with its classification and whether it came from cache, network or a synthetic fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Drive or inspect the worker lifecycle: install, activate or status.")]
    async fn sw_lifecycle(&self, params: Parameters<SwLifecycleParams>) -> Result<CallToolResult, McpError> {
        lifecycle_impl(&self.worker, params.0).await
    }

    #[tool(
        description = "Connect or disconnect a client page. Pages connected before activation are claimed when the worker activates."
    )]
    async fn sw_client(&self, params: Parameters<SwClientParams>) -> Result<CallToolResult, McpError> {
        client_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a control message (skipWaiting or clearCache) to the worker.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push event. Shows a CarDash notification with the payload as its body.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a shown notification by tag. Focuses or opens the dashboard root.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache partitions with entry counts and stored body sizes.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for CarDashServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "cardash-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
