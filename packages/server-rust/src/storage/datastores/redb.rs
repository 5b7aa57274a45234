//! Embedded, durable [`RequestStore`] backed by `redb`.
//!
//! Each append runs in its own write transaction and is committed with
//! redb's default immediate durability before the record is returned. The
//! last issued `requested_at` is kept in a `meta` table inside the same
//! transaction, so stamps stay non-decreasing across process restarts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use launchpad_core::{LaunchRequest, NewLaunchRequest};
use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};
use uuid::Uuid;

use crate::storage::{next_stamp, now_millis, StoreError};
use crate::traits::RequestStore;

/// Request id -> JSON-encoded [`LaunchRequest`].
const REQUESTS: TableDefinition<&str, &[u8]> = TableDefinition::new("launch_requests");
/// Store-wide bookkeeping.
const META: TableDefinition<&str, i64> = TableDefinition::new("meta");
const LAST_STAMP_KEY: &str = "last_requested_at";

/// Durable request store in a single redb file.
pub struct RedbRequestStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbRequestStore {
    /// Opens (or creates) the database at `path` and makes sure both tables
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file cannot be opened or
    /// the tables cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(StoreError::unavailable)?;

        let txn = db.begin_write().map_err(StoreError::unavailable)?;
        {
            txn.open_table(REQUESTS).map_err(StoreError::unavailable)?;
            txn.open_table(META).map_err(StoreError::unavailable)?;
        }
        txn.commit().map_err(StoreError::unavailable)?;

        info!(path = %path.display(), "opened redb request store");
        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn append_blocking(
    db: &Database,
    request: NewLaunchRequest,
    now: i64,
) -> Result<LaunchRequest, StoreError> {
    let txn = db.begin_write().map_err(StoreError::unavailable)?;
    let record = {
        let mut meta = txn.open_table(META).map_err(StoreError::unavailable)?;
        let last = meta
            .get(LAST_STAMP_KEY)
            .map_err(StoreError::unavailable)?
            .map_or(0, |guard| guard.value());
        let stamp = next_stamp(last, now);
        let record = LaunchRequest::from_new(request, Uuid::new_v4().to_string(), stamp);
        let encoded = serde_json::to_vec(&record).map_err(StoreError::unavailable)?;

        let mut requests = txn.open_table(REQUESTS).map_err(StoreError::unavailable)?;
        requests
            .insert(record.request_id.as_str(), encoded.as_slice())
            .map_err(StoreError::unavailable)?;
        meta.insert(LAST_STAMP_KEY, stamp)
            .map_err(StoreError::unavailable)?;
        record
    };
    // Dropping an uncommitted transaction aborts it, so any error above
    // leaves nothing behind.
    txn.commit().map_err(StoreError::unavailable)?;
    Ok(record)
}

fn get_blocking(db: &Database, request_id: &str) -> Result<Option<LaunchRequest>, StoreError> {
    let txn = db.begin_read().map_err(StoreError::unavailable)?;
    let table = txn.open_table(REQUESTS).map_err(StoreError::unavailable)?;
    let Some(guard) = table.get(request_id).map_err(StoreError::unavailable)? else {
        return Ok(None);
    };
    serde_json::from_slice(guard.value())
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            request_id: request_id.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl RequestStore for RedbRequestStore {
    async fn append(&self, request: NewLaunchRequest) -> Result<LaunchRequest, StoreError> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || append_blocking(&db, request, now_millis()))
            .await
            .map_err(StoreError::unavailable)?
    }

    async fn get(&self, request_id: &str) -> Result<Option<LaunchRequest>, StoreError> {
        let db = Arc::clone(&self.db);
        let request_id = request_id.to_string();
        tokio::task::spawn_blocking(move || get_blocking(&db, &request_id))
            .await
            .map_err(StoreError::unavailable)?
    }

    async fn close(&self) -> anyhow::Result<()> {
        // redb flushes on every commit; the file handle closes when the last
        // Arc<Database> drops.
        debug!(path = %self.path.display(), "closing redb request store");
        Ok(())
    }
}
