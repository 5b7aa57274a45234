//! Launch event publishing.
//!
//! - [`pubsub`]: Google Cloud Pub/Sub over its REST API
//! - [`memory`]: records events in process (tests, embedding)
//! - [`log`]: logs events and acks (default when no broker is configured)
//!
//! Publishers only move bytes: the dispatcher encodes the
//! [`LaunchEvent`](launchpad_core::LaunchEvent) once and hands the payload to
//! whichever backend [`build_publisher`] selected at startup.

pub mod log;
pub mod memory;
pub mod pubsub;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub use self::log::LogPublisher;
pub use memory::{InMemoryPublisher, PublishedEvent};
pub use pubsub::{PubSubConfig, PubSubPublisher};

use crate::traits::EventPublisher;

/// Acknowledgement from a channel that accepted a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishAck {
    /// Broker-assigned message id, when the backend reports one.
    pub message_id: Option<String>,
}

/// Failure to hand a payload to a channel.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("transport error publishing to {channel}: {reason}")]
    Transport { channel: String, reason: String },
    #[error("channel {channel} rejected publish with status {status}: {body}")]
    Rejected {
        channel: String,
        status: u16,
        body: String,
    },
    #[error("failed to encode launch event: {0}")]
    Encode(String),
}

/// Which publisher backend to run with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PublisherConfig {
    /// Log every event and ack it.
    #[default]
    Log,
    /// Keep events in process memory.
    Memory,
    /// Google Cloud Pub/Sub REST API.
    PubSub(PubSubConfig),
}

impl PublisherConfig {
    /// Short backend name for logs.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Memory => "memory",
            Self::PubSub(_) => "pubsub",
        }
    }
}

/// Builds the publisher described by `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client for the Pub/Sub backend cannot be
/// constructed.
pub fn build_publisher(config: &PublisherConfig) -> anyhow::Result<Arc<dyn EventPublisher>> {
    let publisher: Arc<dyn EventPublisher> = match config {
        PublisherConfig::Log => Arc::new(LogPublisher),
        PublisherConfig::Memory => Arc::new(InMemoryPublisher::new()),
        PublisherConfig::PubSub(pubsub) => Arc::new(PubSubPublisher::new(pubsub.clone())?),
    };

    info!(backend = config.backend(), "event publisher ready");
    Ok(publisher)
}

/// Default request timeout for broker clients.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_publisher_is_log() {
        assert_eq!(PublisherConfig::default(), PublisherConfig::Log);
    }

    #[tokio::test]
    async fn builds_each_backend() {
        let log = build_publisher(&PublisherConfig::Log).unwrap();
        assert_eq!(log.backend(), "log");

        let memory = build_publisher(&PublisherConfig::Memory).unwrap();
        assert_eq!(memory.backend(), "memory");

        let pubsub = build_publisher(&PublisherConfig::PubSub(PubSubConfig::new("proj"))).unwrap();
        assert_eq!(pubsub.backend(), "pubsub");
    }

    #[test]
    fn error_messages_name_the_channel() {
        let err = PublishError::Rejected {
            channel: "rad-lab-launch-alpha-fold".to_string(),
            status: 403,
            body: "denied".to_string(),
        };
        assert!(err.to_string().contains("rad-lab-launch-alpha-fold"));
        assert!(err.to_string().contains("403"));
    }
}
