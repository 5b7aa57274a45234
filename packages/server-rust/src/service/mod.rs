//! Launch dispatch framework.
//!
//! This module implements the request-to-event pipeline:
//!
//! 1. **Dispatcher** (`dispatcher`): validate, resolve, persist, then publish
//! 2. **Service** (`dispatch_service`): `tower::Service<Bytes>` face of the dispatcher
//! 3. **Middleware** (`middleware`): Tower layers (metrics, load-shedding)

pub mod config;
pub mod dispatch_service;
pub mod dispatcher;
pub mod middleware;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types for convenient access.
pub use config::ServerConfig;
pub use dispatch_service::DispatchService;
pub use dispatcher::{DispatchError, DispatchReceipt, DispatchState, Dispatcher};
pub use middleware::{build_dispatch_pipeline, DispatchPipeline};
