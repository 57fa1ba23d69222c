//! Core types and shared functionality for cardash-sw.
//!
//! This crate provides:
//! - Cache partition store with SQLite backend
//! - Request/response types shared by the worker and server
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, Partition, PartitionStats};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, Response};
