use async_trait::async_trait;
use launchpad_core::{LaunchRequest, NewLaunchRequest};

use crate::publish::{PublishAck, PublishError};
use crate::storage::StoreError;

/// Append-only durable record of accepted launch requests.
///
/// Implementations: redb (embedded, durable), memory (tests, dev).
/// Must be safe to call concurrently from many in-flight requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Durably record a validated request, assigning its `request_id` and
    /// `requested_at`.
    ///
    /// A returned record is proof of durability. On failure nothing is
    /// recorded and [`StoreError::Unavailable`] is returned.
    async fn append(&self, request: NewLaunchRequest) -> Result<LaunchRequest, StoreError>;

    /// Look up a recorded request by id. Used by downstream consumers and
    /// reconciliation tooling, never by the dispatcher.
    async fn get(&self, request_id: &str) -> Result<Option<LaunchRequest>, StoreError>;

    /// Release resources and close connections.
    async fn close(&self) -> anyhow::Result<()>;
}

/// Publishes encoded launch events to named channels.
///
/// Delivery is at-least-once: an ack means the channel will eventually
/// deliver the payload one or more times. Failures are independent of the
/// request store.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `payload` to `channel`.
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<PublishAck, PublishError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
