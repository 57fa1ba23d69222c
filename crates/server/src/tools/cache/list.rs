//! cache_list tool implementation.
//!
//! Lists every partition with its entry count and stored body size.

use cardash_core::PartitionStats;
use cardash_worker::Worker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    /// Partitions the current version keeps on activation.
    pub expected: Vec<String>,
    pub partitions: Vec<PartitionStats>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(worker: &Worker, _params: CacheListParams) -> Result<CallToolResult, McpError> {
    let partitions = worker.cache().partition_stats().await?;
    let expected = worker.config().expected_partitions().iter().map(|s| s.to_string()).collect();

    json_result(&CacheListOutput { expected, partitions })
}
