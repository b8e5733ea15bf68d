use crate::error::{StoreError, StoreResult};
use crate::job_id::JobId;
use crate::record::JobRecord;
use crate::store::BookmarkStore;
use std::collections::HashSet;
use tracing::{debug, warn};

/// In-memory set of bookmarked ids, derived from a [`BookmarkStore`].
///
/// Answers "is this job bookmarked" without reading the store on every render.
/// It is never persisted: the store stays authoritative and the projection is
/// rebuilt from it with [`BookmarkProjection::refresh`].
#[derive(Debug, Clone, Default)]
pub struct BookmarkProjection {
    ids: HashSet<JobId>,
}

/// A feed record together with its bookmark status, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub record: JobRecord,
    pub bookmarked: bool,
}

/// Result of [`toggle_bookmark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Bookmarked,
    Unbookmarked,
}

impl BookmarkProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a projection from the current store contents
    pub async fn load(store: &BookmarkStore) -> Self {
        let mut projection = Self::new();
        projection.refresh(store).await;
        projection
    }

    /// Replace the membership set with the ids currently in the store
    pub async fn refresh(&mut self, store: &BookmarkStore) {
        self.ids = store.list().await.iter().filter_map(JobRecord::key).collect();
        debug!("Jobmark: Bookmark projection refreshed, {} ids", self.ids.len());
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.ids.contains(&id)
    }

    /// Records without an id are never bookmarked
    pub fn is_bookmarked(&self, record: &JobRecord) -> bool {
        record.key().is_some_and(|id| self.contains(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Pair every record with its bookmark status
    pub fn annotate(&self, records: &[JobRecord]) -> Vec<FeedEntry> {
        records
            .iter()
            .map(|record| FeedEntry {
                bookmarked: self.is_bookmarked(record),
                record: record.clone(),
            })
            .collect()
    }
}

/// Flip the bookmark status of `record`.
///
/// The projection decides the direction: a bookmarked id is removed from the
/// store, any other is added. The projection is updated before the store write
/// and restored if the write fails, so it never disagrees with the store after
/// this returns.
pub async fn toggle_bookmark(
    store: &BookmarkStore,
    projection: &mut BookmarkProjection,
    record: &JobRecord,
) -> StoreResult<ToggleOutcome> {
    let Some(id) = record.key() else {
        warn!("Jobmark: Cannot toggle bookmark on a record without an id");
        return Err(StoreError::MissingId);
    };

    if projection.ids.remove(&id) {
        if let Err(err) = store.remove(id).await {
            warn!("Jobmark: Error toggling bookmark {}, restoring it: {}", id, err);
            projection.ids.insert(id);
            return Err(err);
        }
        Ok(ToggleOutcome::Unbookmarked)
    } else {
        projection.ids.insert(id);
        if let Err(err) = store.add(record.clone()).await {
            warn!("Jobmark: Error toggling bookmark {}, dropping it: {}", id, err);
            projection.ids.remove(&id);
            return Err(err);
        }
        Ok(ToggleOutcome::Bookmarked)
    }
}
