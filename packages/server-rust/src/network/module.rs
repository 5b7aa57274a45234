//! Network module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` wires shared state,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! connections. Binding separately lets `main` log the real port (and tests
//! use port 0) before traffic is served.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::middleware::map_response;
use axum::routing::{get, post};
use axum::Router;
use launchpad_core::ModuleRegistry;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    health_handler, launch_handler, liveness_handler, modules_handler, readiness_handler,
    AppState,
};
use super::middleware::{build_http_layers, envelope_bare_errors};
use super::shutdown::ShutdownController;
use crate::service::{build_dispatch_pipeline, DispatchPipeline, Dispatcher, ServerConfig};
use crate::traits::RequestStore;

/// Manages the HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- builds the dispatch pipeline and shutdown controller
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- serves until shutdown is signalled, drains, closes the store
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    registry: Arc<ModuleRegistry>,
    store: Arc<dyn RequestStore>,
    pipeline: DispatchPipeline,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, dispatcher: Arc<Dispatcher>, dispatch: &ServerConfig) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
            registry: Arc::clone(dispatcher.registry()),
            store: Arc::clone(dispatcher.store()),
            pipeline: build_dispatch_pipeline(dispatcher, dispatch),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `POST /launch` -- submit a module launch request
    /// - `GET /modules` -- launchable modules and their channels
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- Kubernetes liveness probe
    /// - `GET /health/ready` -- Kubernetes readiness probe
    pub fn build_router(&self) -> Router {
        let state = AppState {
            pipeline: self.pipeline.clone(),
            registry: Arc::clone(&self.registry),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };
        router(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until the shutdown signal fires.
    ///
    /// After the shutdown signal:
    /// 1. Health state transitions to Draining and new launches get 503
    /// 2. Open connections finish their current requests
    /// 3. Waits up to `drain_timeout` for in-flight launches to settle
    /// 4. Closes the request store
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let shutdown_ctrl = self.shutdown;

        // Transition to Ready so readiness probes pass.
        shutdown_ctrl.set_ready();
        info!("Serving HTTP connections");

        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Shutdown signal received, draining launches");
                signal_ctrl.trigger_shutdown();
            })
            .await?;

        drain_and_close(&shutdown_ctrl, self.store.as_ref(), &self.config).await;
        Ok(())
    }
}

/// Routes plus HTTP middleware over the given state.
pub fn router(state: AppState) -> Router {
    let layers = build_http_layers(&state.config);

    Router::new()
        .route("/launch", post(launch_handler))
        .route("/modules", get(modules_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .layer(DefaultBodyLimit::max(state.config.body_limit))
        .layer(layers)
        .layer(map_response(envelope_bare_errors))
        .with_state(state)
}

/// Waits for in-flight launches, then closes the store.
///
/// The store is closed even when the drain times out; launches still running
/// at that point will see store errors.
async fn drain_and_close(
    shutdown_ctrl: &ShutdownController,
    store: &dyn RequestStore,
    config: &NetworkConfig,
) {
    shutdown_ctrl.trigger_shutdown();

    let drained = shutdown_ctrl.wait_for_drain(config.drain_timeout).await;
    if drained {
        info!("All in-flight launches settled");
    } else {
        warn!(
            in_flight = shutdown_ctrl.in_flight_count(),
            "Drain timeout expired with launches still in flight"
        );
    }

    if let Err(e) = store.close().await {
        error!(error = %e, "Failed to close request store");
    }
}
