//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the partition store.

pub mod list;

pub use list::{CacheListParams, list_impl};
