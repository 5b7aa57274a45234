//! HTTP handler definitions for the launch dispatcher.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod launch;
pub mod modules;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use launch::launch_handler;
pub use modules::modules_handler;

use std::sync::Arc;
use std::time::Instant;

use launchpad_core::ModuleRegistry;

use super::{NetworkConfig, ShutdownController};
use crate::service::DispatchPipeline;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Middleware-wrapped dispatcher that handles `POST /launch` bodies.
    pub pipeline: DispatchPipeline,
    /// Module route table, the same one the dispatcher validates against.
    pub registry: Arc<ModuleRegistry>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Network configuration (bind address, CORS, limits).
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Instant;

    use super::AppState;
    use crate::network::{NetworkConfig, ShutdownController};
    use crate::service::test_support::{dispatcher, ScriptedPublisher, ScriptedStore};
    use crate::service::{build_dispatch_pipeline, ServerConfig};

    /// App state over scripted doubles, still in the `Starting` state.
    pub fn app_state(
        store: &Arc<ScriptedStore>,
        publisher: &Arc<ScriptedPublisher>,
        dispatch: &ServerConfig,
    ) -> AppState {
        let dispatcher = Arc::new(dispatcher(store, publisher));
        AppState {
            registry: Arc::clone(dispatcher.registry()),
            pipeline: build_dispatch_pipeline(dispatcher, dispatch),
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(NetworkConfig::default()),
            start_time: Instant::now(),
        }
    }

    /// Ready app state with default limits and well-behaved doubles.
    pub fn ready_state() -> AppState {
        let state = app_state(
            &Arc::new(ScriptedStore::default()),
            &Arc::new(ScriptedPublisher::default()),
            &ServerConfig::default(),
        );
        state.shutdown.set_ready();
        state
    }
}
