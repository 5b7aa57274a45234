//! Pipeline composition: combines all middleware layers into a single service stack.

use std::sync::Arc;

use bytes::Bytes;
use tower::util::BoxCloneSyncService;
use tower::ServiceBuilder;

use super::load_shed::LoadShedLayer;
use super::metrics::MetricsLayer;
use crate::service::config::ServerConfig;
use crate::service::dispatch_service::DispatchService;
use crate::service::dispatcher::{DispatchError, DispatchReceipt, Dispatcher};

/// Type-erased dispatch pipeline, cheap to clone into each HTTP handler.
pub type DispatchPipeline = BoxCloneSyncService<Bytes, DispatchReceipt, DispatchError>;

/// Build the dispatch pipeline by wrapping a `DispatchService` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded (fail fast before doing any work)
/// 2. `MetricsLayer` -- record timing and outcome (closest to the actual dispatch)
#[must_use]
pub fn build_dispatch_pipeline(dispatcher: Arc<Dispatcher>, config: &ServerConfig) -> DispatchPipeline {
    let svc = ServiceBuilder::new()
        .layer(LoadShedLayer::new(config.max_concurrent_dispatches))
        .layer(MetricsLayer)
        .service(DispatchService::new(dispatcher));
    BoxCloneSyncService::new(svc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
