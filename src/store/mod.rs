pub mod blob;

use crate::config::{DuplicatePolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::job_id::JobId;
use crate::record::JobRecord;
use blob::{BlobStorage, MemoryBlobStorage};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Result of [`BookmarkStore::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The id was already bookmarked and the store rejects duplicates, nothing was written
    AlreadyPresent,
}

/// Result of [`BookmarkStore::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// No record had the id, nothing was written
    NotPresent,
}

/// Durable collection of bookmarked job records, keyed by id.
///
/// The whole collection is kept as one JSON array under a single storage key
/// and every mutation rewrites it completely. Mutations are serialized through
/// an internal lock, so two overlapping `add`/`remove` calls can never lose
/// each other's update.
///
/// The store is cheap to clone, all clones share the same state.
#[derive(Clone)]
pub struct BookmarkStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    storage: Box<dyn BlobStorage>,
    config: StoreConfig,
    write_lock: Mutex<()>,
    revision: watch::Sender<u64>,
}

impl BookmarkStore {
    /// Create a store persisting into `storage`
    ///
    /// # Arguments
    ///
    /// * `storage` - The blob storage backend
    /// * `config` - Storage key and duplicate policy
    pub fn new(storage: impl BlobStorage, config: StoreConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                storage: Box::new(storage),
                config,
                write_lock: Mutex::new(()),
                revision,
            }),
        }
    }

    /// Create a store with default configuration that keeps everything in memory
    pub fn in_memory() -> Self {
        Self::new(MemoryBlobStorage::new(), StoreConfig::default())
    }

    /// All bookmarked records in insertion order.
    ///
    /// Never fails: a missing blob, an unreadable blob or a blob that does not
    /// deserialize all yield an empty list. Use [`BookmarkStore::try_list`] to
    /// see the failure.
    pub async fn list(&self) -> Vec<JobRecord> {
        match self.read_all().await {
            Ok(records) => records,
            Err(err) => {
                warn!("Jobmark: Error fetching bookmarks: {}", err);
                Vec::new()
            }
        }
    }

    /// Same as [`BookmarkStore::list`], but reports read and deserialization failures
    pub async fn try_list(&self) -> StoreResult<Vec<JobRecord>> {
        self.read_all().await
    }

    /// Bookmark a record.
    ///
    /// # Returns
    ///
    /// `AlreadyPresent` when the id is bookmarked and the store rejects duplicates,
    /// `MissingId` error for records without an id, or the read/write failure.
    /// On failure the persisted collection is left as it was.
    pub async fn add(&self, record: JobRecord) -> StoreResult<AddOutcome> {
        let Some(id) = record.key() else {
            warn!("Jobmark: Refusing to bookmark a record without an id");
            return Err(StoreError::MissingId);
        };

        let _guard = self.inner.write_lock.lock().await;
        let mut records = self.read_all().await.map_err(|err| {
            warn!("Jobmark: Error adding bookmark {}: {}", id, err);
            err
        })?;

        if self.inner.config.duplicates == DuplicatePolicy::Reject
            && records.iter().any(|r| r.key() == Some(id))
        {
            debug!("Jobmark: Bookmark {} already present", id);
            return Ok(AddOutcome::AlreadyPresent);
        }

        records.push(record);
        self.write_all(&records).await.map_err(|err| {
            warn!("Jobmark: Error adding bookmark {}: {}", id, err);
            err
        })?;

        debug!("Jobmark: Added bookmark {}", id);
        Ok(AddOutcome::Added)
    }

    /// Remove every bookmarked record with the given id.
    ///
    /// Removing an id that is not bookmarked is a no-op and does not touch the storage.
    pub async fn remove(&self, id: JobId) -> StoreResult<RemoveOutcome> {
        let _guard = self.inner.write_lock.lock().await;
        let mut records = self.read_all().await.map_err(|err| {
            warn!("Jobmark: Error removing bookmark {}: {}", id, err);
            err
        })?;

        let before = records.len();
        records.retain(|r| r.key() != Some(id));
        if records.len() == before {
            debug!("Jobmark: Bookmark {} not present, nothing to remove", id);
            return Ok(RemoveOutcome::NotPresent);
        }

        self.write_all(&records).await.map_err(|err| {
            warn!("Jobmark: Error removing bookmark {}: {}", id, err);
            err
        })?;

        debug!("Jobmark: Removed bookmark {}", id);
        Ok(RemoveOutcome::Removed)
    }

    /// Subscribe to store writes.
    ///
    /// The received value is a revision counter bumped after every completed write.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Number of writes completed so far
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    async fn read_all(&self) -> StoreResult<Vec<JobRecord>> {
        let blob = self.inner.storage.get(&self.inner.config.key).await?;
        match blob {
            Some(blob) => {
                serde_json::from_str(&blob).map_err(|err| StoreError::Deserialize(err.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn write_all(&self, records: &[JobRecord]) -> StoreResult<()> {
        let blob =
            serde_json::to_string(records).map_err(|err| StoreError::Serialize(err.to_string()))?;
        self.inner.storage.set(&self.inner.config.key, blob).await?;
        self.inner.revision.send_modify(|revision| *revision += 1);
        Ok(())
    }
}
