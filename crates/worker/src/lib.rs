//! The CarDash offline worker.
//!
//! This crate intercepts dashboard requests, classifies them, and resolves each
//! through a cache-first, network-first or network-only strategy backed by the
//! partition store in `cardash-core`. It also drives the install/activate
//! lifecycle and handles control messages and push notifications.

pub mod classify;
pub mod clients;
pub mod config;
pub mod control;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

pub use classify::{Classification, Classifier, ExclusionRules};
pub use clients::{Client, ClientId, Clients, WindowClient};
pub use config::{NotificationConfig, WorkerConfig};
pub use control::ControlMessage;
pub use fetch::{FetchClient, FetchConfig, Network};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleState, PrecacheFailure};
pub use notify::Notification;
pub use strategy::{FetchResult, InterceptRecord, Outcome, StrategyEngine};
pub use worker::Worker;
