//! The launch dispatcher: validate, persist, route, publish.
//!
//! Per-request state machine:
//!
//! ```text
//! Received -> Validated -> Persisted -> Dispatched -> Acknowledged
//!     |           |            |
//!     v           v            v
//! Rejected      Failed       Failed
//! ```
//!
//! The store append is the commit point. Once it returns, the request is
//! accepted and the caller gets its `request_id` no matter what happens to
//! the publish. A failed publish leaves a persisted-but-undispatched record
//! that only an out-of-band reconciliation sweep can replay; resubmitting
//! would create a second record because the store has no dedup key.

use std::sync::Arc;

use launchpad_core::{
    LaunchEvent, ModuleRegistry, NewLaunchRequest, RequestValidator, UnknownModule,
    ValidationError,
};
use serde_json::Value;
use tracing::{debug, error, field, info_span, warn, Instrument, Span};

use crate::publish::PublishError;
use crate::storage::StoreError;
use crate::traits::{EventPublisher, RequestStore};

/// Where a single dispatch currently is (or ended up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Validated,
    Persisted,
    Dispatched,
    Acknowledged,
    /// Terminal: the payload failed validation. No side effects happened.
    Rejected,
    /// Terminal: the store append or the publish failed.
    Failed,
    /// Terminal: turned away by load shedding before the payload was read.
    Shed,
}

impl DispatchState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Persisted => "persisted",
            Self::Dispatched => "dispatched",
            Self::Acknowledged => "acknowledged",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::Shed => "shed",
        }
    }
}

/// Result of a dispatch that got past the store append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// Identifier assigned by the store; the only thing the caller sees.
    pub request_id: String,
    pub module: String,
    pub channel: &'static str,
    pub requested_at: i64,
    /// `Acknowledged`, or `Failed` when the publish did not go through.
    pub state: DispatchState,
    /// Why the publish failed. Operational detail, never shown to callers.
    pub publish_error: Option<String>,
}

impl DispatchReceipt {
    /// Whether the launch event reached its channel.
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.state == DispatchState::Acknowledged
    }
}

/// Failures that mean the request was **not** accepted.
///
/// Publish failures are deliberately absent: they happen after the request
/// is durable and are reported through [`DispatchReceipt::publish_error`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnknownModule(#[from] UnknownModule),
    #[error("request store unavailable, request was not accepted")]
    StoreUnavailable(#[source] StoreError),
    #[error("server overloaded, try again later")]
    Overloaded,
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Terminal state the request reached.
    #[must_use]
    pub fn state(&self) -> DispatchState {
        match self {
            Self::Validation(_) | Self::UnknownModule(_) => DispatchState::Rejected,
            Self::StoreUnavailable(_) | Self::Internal(_) => DispatchState::Failed,
            Self::Overloaded => DispatchState::Shed,
        }
    }

    /// Stable label for metrics and logs.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid",
            Self::UnknownModule(_) => "unknown_module",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Overloaded => "overloaded",
            Self::Internal(_) => "internal",
        }
    }
}

fn enter(state: DispatchState) {
    debug!(state = state.as_str(), "dispatch state");
}

/// Orchestrates one launch request end to end.
///
/// Stateless apart from the shared handles it is built with; one instance
/// serves every request concurrently.
pub struct Dispatcher {
    validator: RequestValidator,
    registry: Arc<ModuleRegistry>,
    store: Arc<dyn RequestStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl Dispatcher {
    /// Creates a dispatcher whose validator and channel routing both come
    /// from `registry`.
    #[must_use]
    pub fn new(
        registry: Arc<ModuleRegistry>,
        store: Arc<dyn RequestStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            validator: RequestValidator::new(Arc::clone(&registry)),
            registry,
            store,
            publisher,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RequestStore> {
        &self.store
    }

    /// Dispatches a raw request body.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch); malformed JSON is a
    /// [`ValidationError::MalformedBody`].
    pub async fn dispatch_bytes(&self, body: &[u8]) -> Result<DispatchReceipt, DispatchError> {
        let span = dispatch_span();
        async {
            enter(DispatchState::Received);
            let request = self.validator.validate_bytes(body).inspect_err(rejected)?;
            self.dispatch_validated(request).await
        }
        .instrument(span)
        .await
    }

    /// Dispatches a decoded payload.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Validation`] / [`DispatchError::UnknownModule`]:
    ///   nothing was stored or published.
    /// - [`DispatchError::StoreUnavailable`]: nothing was stored or published;
    ///   the caller may resubmit.
    pub async fn dispatch(&self, payload: &Value) -> Result<DispatchReceipt, DispatchError> {
        let span = dispatch_span();
        async {
            enter(DispatchState::Received);
            let request = self.validator.validate(payload).inspect_err(rejected)?;
            self.dispatch_validated(request).await
        }
        .instrument(span)
        .await
    }

    async fn dispatch_validated(
        &self,
        request: NewLaunchRequest,
    ) -> Result<DispatchReceipt, DispatchError> {
        Span::current().record("module", request.module.as_str());

        // Pure lookup, done before any side effect so an unroutable module
        // is never persisted.
        let channel = self.registry.resolve(&request.module).inspect_err(|e| {
            error!(error = %e, "validator accepted a module the registry cannot route");
            enter(DispatchState::Rejected);
        })?;
        enter(DispatchState::Validated);

        let record = self.store.append(request).await.map_err(|e| {
            warn!(error = %e, "store append failed, request not accepted");
            enter(DispatchState::Failed);
            DispatchError::StoreUnavailable(e)
        })?;
        Span::current().record("request_id", record.request_id.as_str());
        enter(DispatchState::Persisted);

        let published = match LaunchEvent::new(record.request_id.as_str()).to_json_bytes() {
            Ok(payload) => {
                enter(DispatchState::Dispatched);
                self.publisher.publish(channel, &payload).await
            }
            Err(e) => Err(PublishError::Encode(e.to_string())),
        };

        let (state, publish_error) = match published {
            Ok(ack) => {
                debug!(message_id = ?ack.message_id, channel, "launch event acknowledged");
                (DispatchState::Acknowledged, None)
            }
            Err(e) => {
                error!(
                    alert = "launch_event_undelivered",
                    request_id = %record.request_id,
                    module = %record.module,
                    channel,
                    backend = self.publisher.backend(),
                    error = %e,
                    "launch event publish failed; request is persisted but not dispatched and needs reconciliation"
                );
                metrics::counter!(
                    "launchpad_publish_failures_total",
                    "module" => record.module.clone()
                )
                .increment(1);
                (DispatchState::Failed, Some(e.to_string()))
            }
        };
        enter(state);

        Ok(DispatchReceipt {
            request_id: record.request_id,
            module: record.module,
            channel,
            requested_at: record.requested_at,
            state,
            publish_error,
        })
    }
}

fn dispatch_span() -> Span {
    info_span!("dispatch", module = field::Empty, request_id = field::Empty)
}

fn rejected(err: &ValidationError) {
    debug!(error = %err, field = err.field(), "launch payload rejected");
    enter(DispatchState::Rejected);
}
