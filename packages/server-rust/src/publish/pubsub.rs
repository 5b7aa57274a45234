//! Google Cloud Pub/Sub publisher over the REST API.
//!
//! Each channel name is a Pub/Sub topic id in the configured project. A
//! publish is `POST {endpoint}/v1/projects/{project}/topics/{topic}:publish`
//! with the payload base64-encoded in a single message. Pointing `endpoint`
//! at the Pub/Sub emulator works without an access token.

use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::publish::{PublishAck, PublishError, DEFAULT_PUBLISH_TIMEOUT};
use crate::traits::EventPublisher;

/// Production Pub/Sub endpoint.
pub const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Connection settings for [`PubSubPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubConfig {
    /// Project owning the launch topics.
    pub project_id: String,
    /// Base URL of the Pub/Sub REST API (or an emulator).
    pub endpoint: String,
    /// OAuth bearer token. `None` for emulators.
    pub access_token: Option<String>,
    /// Per-publish HTTP timeout.
    pub timeout: Duration,
}

impl PubSubConfig {
    /// Settings for `project_id` against the production endpoint.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint: DEFAULT_PUBSUB_ENDPOINT.to_string(),
            access_token: None,
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    messages: [PubsubMessage<'a>; 1],
}

#[derive(Serialize)]
struct PubsubMessage<'a> {
    data: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Publishes launch events to Pub/Sub topics.
///
/// Holds one pooled `reqwest::Client` for the whole process.
pub struct PubSubPublisher {
    client: reqwest::Client,
    config: PubSubConfig,
}

impl PubSubPublisher {
    /// Builds the HTTP client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: PubSubConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn topic_url(&self, channel: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.config.endpoint.trim_end_matches('/'),
            self.config.project_id,
            channel
        )
    }
}

#[async_trait]
impl EventPublisher for PubSubPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<PublishAck, PublishError> {
        let data = BASE64_STANDARD.encode(payload);
        let body = PublishRequest {
            messages: [PubsubMessage { data: &data }],
        };

        let mut request = self.client.post(self.topic_url(channel)).json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let transport = |e: reqwest::Error| PublishError::Transport {
            channel: channel.to_string(),
            reason: e.to_string(),
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                channel: channel.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PublishResponse = response.json().await.map_err(transport)?;
        let message_id = parsed.message_ids.into_iter().next();
        debug!(channel, message_id = ?message_id, "published to pubsub");
        Ok(PublishAck { message_id })
    }

    fn backend(&self) -> &'static str {
        "pubsub"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use super::*;

    #[derive(Debug, Clone)]
    struct Captured {
        project: String,
        topic: String,
        authorization: Option<String>,
        body: Value,
    }

    type Log = Arc<Mutex<Vec<Captured>>>;

    async fn fake_publish(
        State(log): State<Log>,
        Path((project, topic)): Path<(String, String)>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let Some(topic) = topic.strip_suffix(":publish") else {
            return (StatusCode::NOT_FOUND, Json(json!({})));
        };
        if topic == "denied-topic" {
            return (StatusCode::FORBIDDEN, Json(json!({"error": "denied"})));
        }
        log.lock().push(Captured {
            project,
            topic: topic.to_string(),
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
        (StatusCode::OK, Json(json!({"messageIds": ["m-1"]})))
    }

    /// Serves a fake Pub/Sub REST API on an OS-assigned port.
    async fn fake_pubsub() -> (String, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/v1/projects/{project}/topics/{topic}", post(fake_publish))
            .with_state(Arc::clone(&log));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}"), log)
    }

    fn publisher(endpoint: &str, token: Option<&str>) -> PubSubPublisher {
        PubSubPublisher::new(PubSubConfig {
            project_id: "radlab".to_string(),
            endpoint: endpoint.to_string(),
            access_token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn topic_url_joins_endpoint_project_and_channel() {
        let p = publisher("https://pubsub.example.com/", None);
        assert_eq!(
            p.topic_url("rad-lab-launch-alpha-fold"),
            "https://pubsub.example.com/v1/projects/radlab/topics/rad-lab-launch-alpha-fold:publish"
        );
    }

    #[tokio::test]
    async fn publishes_base64_payload_with_bearer_token() {
        let (endpoint, log) = fake_pubsub().await;
        let p = publisher(&endpoint, Some("tok"));

        let ack = p
            .publish("rad-lab-launch-data-science", br#"{"requestId":"r1"}"#)
            .await
            .unwrap();
        assert_eq!(ack.message_id.as_deref(), Some("m-1"));

        let captured = log.lock().clone();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].project, "radlab");
        assert_eq!(captured[0].topic, "rad-lab-launch-data-science");
        assert_eq!(captured[0].authorization.as_deref(), Some("Bearer tok"));

        let data = captured[0].body["messages"][0]["data"].as_str().unwrap();
        let decoded = BASE64_STANDARD.decode(data).unwrap();
        assert_eq!(decoded, br#"{"requestId":"r1"}"#);
    }

    #[tokio::test]
    async fn emulator_publish_sends_no_authorization() {
        let (endpoint, log) = fake_pubsub().await;
        publisher(&endpoint, None)
            .publish("rad-lab-launch-alpha-fold", b"{}")
            .await
            .unwrap();
        assert!(log.lock()[0].authorization.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (endpoint, _log) = fake_pubsub().await;
        let err = publisher(&endpoint, None)
            .publish("denied-topic", b"{}")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Rejected { status: 403, .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = publisher(&format!("http://{addr}"), None)
            .publish("rad-lab-launch-alpha-fold", b"{}")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Transport { .. }));
    }
}
