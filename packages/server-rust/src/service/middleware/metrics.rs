//! Metrics middleware for dispatches.
//!
//! Wraps each dispatch in a `tracing` span carrying duration and outcome, and
//! records the same data through the `metrics` facade:
//!
//! - `launchpad_dispatch_total{outcome}` counter
//! - `launchpad_dispatch_duration_seconds` histogram
//!
//! Without an installed recorder the `metrics` calls are no-ops.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::dispatcher::{DispatchError, DispatchReceipt};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments dispatches with timing and outcome counting.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records dispatch duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

/// Outcome label for a finished dispatch.
///
/// `accepted_undelivered` marks requests that were persisted but whose launch
/// event could not be published.
#[must_use]
pub fn outcome_label(result: &Result<DispatchReceipt, DispatchError>) -> &'static str {
    match result {
        Ok(receipt) if receipt.delivered() => "accepted",
        Ok(_) => "accepted_undelivered",
        Err(e) => e.outcome(),
    }
}

impl<S, R> Service<R> for MetricsService<S>
where
    S: Service<R, Response = DispatchReceipt, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = DispatchReceipt;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<DispatchReceipt, DispatchError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let span = info_span!(
            "launch",
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();
                let outcome = outcome_label(&result);

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                metrics::counter!("launchpad_dispatch_total", "outcome" => outcome).increment(1);
                metrics::histogram!("launchpad_dispatch_duration_seconds")
                    .record(elapsed.as_secs_f64());

                tracing::info!(duration_ms, outcome, "launch handled");

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
