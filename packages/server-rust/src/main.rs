//! `launchpad-server` binary entrypoint.
//!
//! Parses flags and environment, builds the store and publisher once, and
//! serves until SIGINT or SIGTERM.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use launchpad_core::ModuleRegistry;
use launchpad_server::observability::{init_metrics, init_tracing};
use launchpad_server::publish::build_publisher;
use launchpad_server::storage::build_store;
use launchpad_server::{Cli, Dispatcher, NetworkModule};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Cli::parse().into_settings()?;

    init_tracing(settings.log_format);
    if let Some(addr) = settings.metrics_addr {
        init_metrics(addr)?;
    }

    let registry = Arc::new(ModuleRegistry::default());
    let store = build_store(&settings.store)?;
    let publisher = build_publisher(&settings.publisher)?;
    info!(
        store = settings.store.backend(),
        publisher = settings.publisher.backend(),
        modules = registry.len(),
        "launchpad starting"
    );

    let dispatcher = Arc::new(Dispatcher::new(registry, store, publisher));
    let mut network = NetworkModule::new(settings.network, dispatcher, &settings.dispatch);
    let port = network.start().await?;
    info!(port, "launchpad listening");

    network.serve(shutdown_signal()).await?;
    info!("launchpad stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
