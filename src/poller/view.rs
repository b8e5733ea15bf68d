use crate::job_id::JobId;
use crate::record::JobRecord;
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read-only snapshot of the bookmark collection, kept fresh by a [`crate::poller::SyncPoller`].
///
/// Cheap to clone, all clones see the same collection.
#[derive(Clone, Default)]
pub struct BookmarkView {
    inner: Arc<RwLock<ViewState>>,
}

struct ViewState {
    records: Vec<JobRecord>,
    loading: bool,
    refreshed_at: Option<DateTime<Utc>>,
    refresh_count: u64,
    // store revision the records reflect
    revision: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            loading: true,
            refreshed_at: None,
            refresh_count: 0,
            revision: 0,
        }
    }
}

impl BookmarkView {
    pub fn records(&self) -> Vec<JobRecord> {
        self.read().records.clone()
    }

    /// True until the first load from the store has completed
    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.read().refreshed_at
    }

    /// How many times the collection was reloaded from the store
    pub fn refresh_count(&self) -> u64 {
        self.read().refresh_count
    }

    /// Replace the records with a list read at store `revision`.
    ///
    /// A list read before a change the view already applied is dropped, returns `false` then.
    pub(crate) fn replace(&self, records: Vec<JobRecord>, revision: u64) -> bool {
        let mut state = self.write();
        if revision < state.revision {
            return false;
        }
        state.records = records;
        state.revision = revision;
        state.loading = false;
        state.refreshed_at = Some(Utc::now());
        state.refresh_count += 1;
        true
    }

    /// Drop `id` after a removal that brought the store to `revision`
    pub(crate) fn forget(&self, id: JobId, revision: u64) {
        let mut state = self.write();
        state.records.retain(|r| r.key() != Some(id));
        state.revision = state.revision.max(revision);
    }

    // the state is plain data, a panic while holding the lock cannot leave it half updated
    fn read(&self) -> RwLockReadGuard<'_, ViewState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ViewState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
