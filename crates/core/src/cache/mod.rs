//! SQLite-backed store of named cache partitions.
//!
//! A partition maps a normalized GET request to a stored response. The worker
//! keeps one versioned precache partition (the app shell) and one runtime
//! partition (tiles and CDN assets); anything else is stale and is removed on
//! activation. This module provides:
//!
//! - Idempotent partition creation and name-based lookup
//! - Request-keyed response storage using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent readers and writers

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use partitions::{Partition, PartitionStats};
