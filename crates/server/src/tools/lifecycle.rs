//! sw_lifecycle tool implementation.

use cardash_worker::{ActivateReport, Client, InstallReport, LifecycleState, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    /// Precache the app shell.
    Install,
    /// Drop stale partitions and take control of clients.
    Activate,
    /// Report the current state only.
    Status,
}

/// Parameters for the sw_lifecycle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwLifecycleParams {
    pub action: LifecycleAction,
}

/// Output from the sw_lifecycle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwLifecycleOutput {
    /// State after the action.
    pub state: LifecycleState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activate: Option<ActivateReport>,
    pub clients: Vec<Client>,
}

/// Implementation of the sw_lifecycle tool.
pub async fn lifecycle_impl(worker: &Worker, params: SwLifecycleParams) -> Result<CallToolResult, McpError> {
    let (install, activate) = match params.action {
        LifecycleAction::Install => (Some(worker.install().await?), None),
        LifecycleAction::Activate => (None, Some(worker.activate().await?)),
        LifecycleAction::Status => (None, None),
    };

    let output = SwLifecycleOutput {
        state: worker.state().await,
        install,
        activate,
        clients: worker.clients().list().await,
    };
    json_result(&output)
}
