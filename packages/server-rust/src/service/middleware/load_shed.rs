//! Load-shedding middleware for dispatches.
//!
//! Rejects launches when the server is overloaded (concurrent count exceeds
//! `max_concurrent_dispatches`) with `DispatchError::Overloaded`. A shed
//! request is rejected before validation, so it never reaches the store.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::Semaphore;
use tower::{Layer, Service};

use crate::service::dispatcher::{DispatchError, DispatchReceipt};

// ---------------------------------------------------------------------------
// LoadShedLayer
// ---------------------------------------------------------------------------

/// Tower layer that limits concurrent dispatches via a semaphore.
///
/// When all permits are taken, incoming launches are rejected immediately
/// with `DispatchError::Overloaded` rather than queued.
#[derive(Debug, Clone)]
pub struct LoadShedLayer {
    semaphore: Arc<Semaphore>,
}

impl LoadShedLayer {
    /// Create a new `LoadShedLayer` with the given concurrency limit.
    #[must_use]
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
        }
    }
}

impl<S> Layer<S> for LoadShedLayer {
    type Service = LoadShedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoadShedService {
            inner,
            semaphore: self.semaphore.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadShedService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces a concurrency limit via semaphore-based backpressure.
#[derive(Debug, Clone)]
pub struct LoadShedService<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
}

impl<S, R> Service<R> for LoadShedService<S>
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
        // Try to acquire a permit without waiting. If none available, reject.
        let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
            return Box::pin(async { Err(DispatchError::Overloaded) });
        };

        let fut = self.inner.call(req);
        Box::pin(async move {
            // Hold the permit for the duration of the dispatch.
            let result = fut.await;
            drop(permit);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
