//! Command-line and environment configuration.
//!
//! Every setting can be given as a flag or an environment variable; flags
//! win. [`Cli::into_settings`] turns the raw values into the typed configs
//! each module is built from.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::network::NetworkConfig;
use crate::observability::LogFormat;
use crate::publish::{PubSubConfig, PublisherConfig};
use crate::service::ServerConfig;
use crate::storage::StoreConfig;

/// Request store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    Redb,
}

/// Event publisher backend selector.
///
/// The in-memory publisher never delivers anything, so it is not offered
/// here. Tests and embedders build [`PublisherConfig::Memory`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PublisherKind {
    Log,
    Pubsub,
}

/// Launchpad intake server.
#[derive(Debug, Parser)]
#[command(name = "launchpad-server", version, about, long_about = None)]
pub struct Cli {
    /// Address to bind to
    #[arg(long, env = "LAUNCHPAD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    #[arg(
        long = "cors-origin",
        env = "LAUNCHPAD_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    pub cors_origins: Vec<String>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "LAUNCHPAD_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Launches allowed in flight before new ones get 503
    #[arg(long, env = "LAUNCHPAD_MAX_CONCURRENT_DISPATCHES", default_value_t = 1000)]
    pub max_concurrent_dispatches: u32,

    /// Request store backend
    #[arg(long, env = "LAUNCHPAD_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// Database file for the redb store
    #[arg(long, env = "LAUNCHPAD_REDB_PATH", default_value = "launchpad.redb")]
    pub redb_path: PathBuf,

    /// Event publisher backend
    #[arg(long, env = "LAUNCHPAD_PUBLISHER", value_enum, default_value_t = PublisherKind::Log)]
    pub publisher: PublisherKind,

    /// Google Cloud project owning the launch topics
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub pubsub_project: Option<String>,

    /// Pub/Sub REST endpoint (set to the emulator for local runs)
    #[arg(long, env = "PUBSUB_ENDPOINT", default_value = crate::publish::pubsub::DEFAULT_PUBSUB_ENDPOINT)]
    pub pubsub_endpoint: String,

    /// OAuth bearer token for Pub/Sub
    #[arg(long, env = "PUBSUB_ACCESS_TOKEN", hide_env_values = true)]
    pub pubsub_token: Option<String>,

    /// Per-publish timeout in seconds
    #[arg(long, env = "LAUNCHPAD_PUBLISH_TIMEOUT_SECS", default_value_t = 10)]
    pub publish_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "LAUNCHPAD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "LAUNCHPAD_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

/// Typed configuration for every server module.
#[derive(Debug, Clone)]
pub struct Settings {
    pub network: NetworkConfig,
    pub dispatch: ServerConfig,
    pub store: StoreConfig,
    pub publisher: PublisherConfig,
    pub log_format: LogFormat,
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Converts parsed arguments into [`Settings`].
    ///
    /// # Errors
    ///
    /// Fails when the `pubsub` publisher is selected without a project.
    pub fn into_settings(self) -> anyhow::Result<Settings> {
        let network = NetworkConfig {
            host: self.host,
            port: self.port,
            cors_origins: self.cors_origins,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        };

        let store = match self.store {
            StoreKind::Memory => StoreConfig::Memory,
            StoreKind::Redb => StoreConfig::Redb {
                path: self.redb_path,
            },
        };

        let publisher = match self.publisher {
            PublisherKind::Log => PublisherConfig::Log,
            PublisherKind::Pubsub => {
                let Some(project_id) = self.pubsub_project.filter(|p| !p.trim().is_empty()) else {
                    anyhow::bail!(
                        "--pubsub-project (or GOOGLE_CLOUD_PROJECT) is required with --publisher pubsub"
                    );
                };
                PublisherConfig::PubSub(PubSubConfig {
                    project_id,
                    endpoint: self.pubsub_endpoint,
                    access_token: self.pubsub_token,
                    timeout: Duration::from_secs(self.publish_timeout_secs),
                })
            }
        };

        Ok(Settings {
            network,
            dispatch: ServerConfig {
                max_concurrent_dispatches: self.max_concurrent_dispatches,
            },
            store,
            publisher,
            log_format: self.log_format,
            metrics_addr: self.metrics_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["launchpad-server"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn explicit_flags_build_settings() {
        let settings = parse(&[
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--cors-origin",
            "https://a.example,https://b.example",
            "--request-timeout-secs",
            "5",
            "--max-concurrent-dispatches",
            "7",
            "--store",
            "redb",
            "--redb-path",
            "/tmp/x.redb",
            "--publisher",
            "log",
            "--log-format",
            "pretty",
        ])
        .into_settings()
        .unwrap();

        assert_eq!(settings.network.bind_addr(), "127.0.0.1:9000");
        assert_eq!(
            settings.network.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(settings.network.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.dispatch.max_concurrent_dispatches, 7);
        assert_eq!(
            settings.store,
            StoreConfig::Redb {
                path: PathBuf::from("/tmp/x.redb")
            }
        );
        assert_eq!(settings.publisher, PublisherConfig::Log);
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert!(settings.metrics_addr.is_none());
    }

    #[test]
    fn pubsub_settings_carry_project_and_timeout() {
        let settings = parse(&[
            "--publisher",
            "pubsub",
            "--pubsub-project",
            "rad-lab",
            "--pubsub-endpoint",
            "http://localhost:8085",
            "--publish-timeout-secs",
            "3",
        ])
        .into_settings()
        .unwrap();

        let PublisherConfig::PubSub(pubsub) = settings.publisher else {
            panic!("expected pubsub publisher");
        };
        assert_eq!(pubsub.project_id, "rad-lab");
        assert_eq!(pubsub.endpoint, "http://localhost:8085");
        assert_eq!(pubsub.timeout, Duration::from_secs(3));
    }

    #[test]
    fn pubsub_without_project_is_rejected() {
        if std::env::var_os("GOOGLE_CLOUD_PROJECT").is_some() {
            return;
        }
        let err = parse(&["--publisher", "pubsub"]).into_settings().unwrap_err();
        assert!(err.to_string().contains("pubsub-project"));
    }

    #[test]
    fn memory_publisher_is_not_selectable_from_cli() {
        let err = Cli::try_parse_from(["launchpad-server", "--publisher", "memory"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn unknown_store_is_a_parse_error() {
        assert!(Cli::try_parse_from(["launchpad-server", "--store", "postgres"]).is_err());
    }

    #[test]
    fn metrics_addr_parses() {
        let settings = parse(&["--metrics-addr", "127.0.0.1:9090"])
            .into_settings()
            .unwrap();
        assert_eq!(
            settings.metrics_addr,
            Some("127.0.0.1:9090".parse().unwrap())
        );
    }
}
