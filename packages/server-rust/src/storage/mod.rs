//! Durable storage for accepted launch requests.
//!
//! - [`datastores`]: [`RequestStore`](crate::traits::RequestStore) backends
//!   (in-memory and `redb`)
//! - [`factory`]: builds the configured backend once at startup
//!
//! Every backend stamps `requested_at` with [`next_stamp`] under its own
//! write lock, which keeps stamps non-decreasing in insertion order even when
//! the wall clock steps backwards.

pub mod datastores;
pub mod factory;

use std::time::{SystemTime, UNIX_EPOCH};

pub use datastores::MemoryRequestStore;
#[cfg(feature = "redb")]
pub use datastores::RedbRequestStore;
pub use factory::{build_store, StoreConfig};

/// Failure of a request store operation.
///
/// A failed append never leaves a partial record behind, so the caller can
/// treat the request as not accepted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request store unavailable: {0}")]
    Unavailable(String),
    #[error("stored record {request_id} is corrupt: {reason}")]
    Corrupt { request_id: String, reason: String },
}

impl StoreError {
    pub(crate) fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Returns the current wall-clock time as milliseconds since the Unix epoch.
///
/// Millisecond timestamps fit comfortably in i64 until the year 292 million.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Next `requested_at` given the previous stamp in the same store.
#[must_use]
pub fn next_stamp(last: i64, now: i64) -> i64 {
    now.max(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_stamp_follows_clock_forward() {
        assert_eq!(next_stamp(100, 150), 150);
    }

    #[test]
    fn next_stamp_never_goes_backwards() {
        assert_eq!(next_stamp(200, 150), 200);
        assert_eq!(next_stamp(200, 200), 200);
    }
}
