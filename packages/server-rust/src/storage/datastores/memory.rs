//! In-memory [`RequestStore`] implementation.
//!
//! [`MemoryRequestStore`] keeps records in insertion order behind a single
//! mutex. Nothing survives a restart, so it is meant for tests, benchmarks
//! and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use launchpad_core::{LaunchRequest, NewLaunchRequest};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::storage::{next_stamp, now_millis, StoreError};
use crate::traits::RequestStore;

#[derive(Default)]
struct Inner {
    records: Vec<LaunchRequest>,
    by_id: HashMap<String, usize>,
    last_stamp: i64,
}

/// Volatile request store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryRequestStore {
    inner: Mutex<Inner>,
}

impl MemoryRequestStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Snapshot of all records in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<LaunchRequest> {
        self.inner.lock().records.clone()
    }

    fn append_at(&self, request: NewLaunchRequest, now: i64) -> LaunchRequest {
        let mut inner = self.inner.lock();
        let stamp = next_stamp(inner.last_stamp, now);
        let record = LaunchRequest::from_new(request, Uuid::new_v4().to_string(), stamp);

        let index = inner.records.len();
        inner.by_id.insert(record.request_id.clone(), index);
        inner.records.push(record.clone());
        inner.last_stamp = stamp;
        record
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn append(&self, request: NewLaunchRequest) -> Result<LaunchRequest, StoreError> {
        Ok(self.append_at(request, now_millis()))
    }

    async fn get(&self, request_id: &str) -> Result<Option<LaunchRequest>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .by_id
            .get(request_id)
            .map(|&index| inner.records[index].clone()))
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
