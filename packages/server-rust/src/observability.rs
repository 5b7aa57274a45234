//! Logging and metrics initialization.
//!
//! `tracing` is used everywhere; this module installs the subscriber once
//! per process and, when asked, the Prometheus exporter for the `metrics`
//! facade.

use std::net::SocketAddr;
use std::sync::Once;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    #[default]
    Json,
    /// Pretty-printed logs (for development).
    Pretty,
}

/// Initializes the tracing subscriber.
///
/// Safe to call multiple times; subsequent calls are no-ops. Levels come
/// from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(env_filter);
        // try_init: a test harness may already own the global subscriber.
        let _ = match format {
            LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
            LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        };
    });
}

/// Installs the global Prometheus recorder and serves it on `addr`.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot be started.
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter on {addr}: {e}"))?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
