//! HTTP handler definitions for the key/value server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod kv;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use kv::{get_handler, method_not_allowed_handler, post_handler};

use std::sync::Arc;
use std::time::Instant;

use kvs_core::KvStore;

use super::{NetworkConfig, ShutdownController};

/// Shared application state passed to all axum handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// The storage substrate backing the key/value surface.
    pub store: Arc<KvStore>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Network configuration (bind address, per-connection settings).
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
