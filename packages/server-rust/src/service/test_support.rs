//! Store and publisher doubles with call counting, shared by dispatcher,
//! pipeline, and HTTP handler tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use launchpad_core::{LaunchRequest, ModuleRegistry, NewLaunchRequest};
use parking_lot::Mutex;

use crate::publish::{PublishAck, PublishError};
use crate::service::dispatcher::Dispatcher;
use crate::storage::StoreError;
use crate::traits::{EventPublisher, RequestStore};

/// Store that hands out scripted ids (or `r1`, `r2`, ... once exhausted) or
/// fails every append.
#[derive(Default)]
pub struct ScriptedStore {
    ids: Mutex<VecDeque<String>>,
    fail: bool,
    delay: Option<Duration>,
    appends: AtomicUsize,
    records: Mutex<Vec<LaunchRequest>>,
}

impl ScriptedStore {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            ids: Mutex::new(ids.iter().map(|id| (*id).to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Store whose appends take `delay` before succeeding.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<LaunchRequest> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl RequestStore for ScriptedStore {
    async fn append(&self, request: NewLaunchRequest) -> Result<LaunchRequest, StoreError> {
        let n = self.appends.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        let id = self
            .ids
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("r{n}"));
        let record = LaunchRequest::from_new(request, id, 1_700_000_000_000);
        self.records.lock().push(record.clone());
        Ok(record)
    }

    async fn get(&self, request_id: &str) -> Result<Option<LaunchRequest>, StoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| r.request_id == request_id)
            .cloned())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Publisher that records every call and optionally fails all of them.
#[derive(Default)]
pub struct ScriptedPublisher {
    fail: bool,
    calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl EventPublisher for ScriptedPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<PublishAck, PublishError> {
        self.calls
            .lock()
            .push((channel.to_string(), payload.to_vec()));
        if self.fail {
            return Err(PublishError::Transport {
                channel: channel.to_string(),
                reason: "deadline exceeded".to_string(),
            });
        }
        Ok(PublishAck {
            message_id: Some("m-1".to_string()),
        })
    }

    fn backend(&self) -> &'static str {
        "scripted"
    }
}

/// Dispatcher over the builtin module table and the given doubles.
pub fn dispatcher(store: &Arc<ScriptedStore>, publisher: &Arc<ScriptedPublisher>) -> Dispatcher {
    Dispatcher::new(
        Arc::new(ModuleRegistry::default()),
        Arc::clone(store) as Arc<dyn RequestStore>,
        Arc::clone(publisher) as Arc<dyn EventPublisher>,
    )
}
