//! Publisher that only logs.

use async_trait::async_trait;
use tracing::info;

use crate::publish::{PublishAck, PublishError};
use crate::traits::EventPublisher;

/// Logs each launch event at `info` and acks it.
///
/// Nothing is delivered anywhere. Used when no broker is configured, so that
/// the intake path can run end to end in development.
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<PublishAck, PublishError> {
        info!(
            channel,
            payload = %String::from_utf8_lossy(payload),
            "launch event (log publisher, not delivered)"
        );
        Ok(PublishAck::default())
    }

    fn backend(&self) -> &'static str {
        "log"
    }
}
