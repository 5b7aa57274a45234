//! In-process [`EventPublisher`] that keeps every published payload.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::publish::{PublishAck, PublishError};
use crate::traits::EventPublisher;

/// One payload accepted by [`InMemoryPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub channel: String,
    pub payload: Vec<u8>,
}

/// Records published payloads in order. Message ids are sequence numbers.
#[derive(Default)]
pub struct InMemoryPublisher {
    events: Mutex<Vec<PublishedEvent>>,
}

impl InMemoryPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in publish order.
    #[must_use]
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().clone()
    }

    /// Payloads published to one channel, in publish order.
    #[must_use]
    pub fn events_for(&self, channel: &str) -> Vec<Vec<u8>> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.channel == channel)
            .map(|event| event.payload.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<PublishAck, PublishError> {
        let mut events = self.events.lock();
        events.push(PublishedEvent {
            channel: channel.to_string(),
            payload: payload.to_vec(),
        });
        Ok(PublishAck {
            message_id: Some(events.len().to_string()),
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
