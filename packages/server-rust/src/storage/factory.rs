//! Startup wiring for the configured [`RequestStore`] backend.
//!
//! The store is built exactly once per process and shared as an
//! `Arc<dyn RequestStore>`; request handlers never construct clients.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::storage::datastores::MemoryRequestStore;
use crate::storage::StoreError;
use crate::traits::RequestStore;

/// Which request store backend to run with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreConfig {
    /// Volatile in-process store.
    #[default]
    Memory,
    /// Embedded redb database at `path`.
    Redb { path: PathBuf },
}

impl StoreConfig {
    /// Short backend name for logs and health output.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb { .. } => "redb",
        }
    }
}

/// Builds the request store described by `config`.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the backend cannot be opened, or if
/// it was compiled out of this build.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn RequestStore>, StoreError> {
    let store: Arc<dyn RequestStore> = match config {
        StoreConfig::Memory => Arc::new(MemoryRequestStore::new()),
        #[cfg(feature = "redb")]
        StoreConfig::Redb { path } => {
            Arc::new(crate::storage::datastores::RedbRequestStore::open(path)?)
        }
        #[cfg(not(feature = "redb"))]
        StoreConfig::Redb { .. } => {
            return Err(StoreError::Unavailable(
                "redb support not compiled in (enable the `redb` feature)".to_string(),
            ))
        }
    };

    info!(backend = config.backend(), "request store ready");
    Ok(store)
}
