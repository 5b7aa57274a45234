//! Tower middleware layers for the dispatch pipeline.
//!
//! - [`metrics`]: Dispatch timing and outcome counting
//! - [`load_shed`]: Semaphore-based concurrency limiting
//! - [`pipeline`]: Composes all layers into a single service stack

pub mod load_shed;
pub mod metrics;
pub mod pipeline;

pub use load_shed::LoadShedLayer;
pub use metrics::MetricsLayer;
pub use pipeline::{build_dispatch_pipeline, DispatchPipeline};
