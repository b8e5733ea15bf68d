mod view;

pub use view::BookmarkView;

use crate::config::PollerConfig;
use crate::error::StoreResult;
use crate::job_id::JobId;
use crate::store::{BookmarkStore, RemoveOutcome};
use std::time::Duration;
use tokio::select;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Keeps a [`BookmarkView`] in sync with a [`BookmarkStore`] by reloading it on a fixed interval.
///
/// The view is loaded once right away and then every `interval`, so a write made
/// anywhere else shows up after at most one interval. With `follow_changes`
/// the view is also reloaded as soon as the store reports a write.
///
/// Polling stops when [`SyncPoller::stop`] is called or the poller is dropped.
pub struct SyncPoller {
    id: String,
    store: BookmarkStore,
    view: BookmarkView,
    cancellation_token: CancellationToken,
    #[allow(dead_code)]
    join: JoinHandle<()>,
}

impl SyncPoller {
    /// Start polling `store`. Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `store` - The store to read bookmarks from
    /// * `config` - Interval, change following and the name used in logs
    pub fn start(store: BookmarkStore, config: PollerConfig) -> Self {
        let id = generate_poller_id();
        let view = BookmarkView::default();
        let cancellation_token = CancellationToken::new();

        let interval = if config.interval < MIN_INTERVAL {
            warn!(
                "Jobmark: Poll interval {:?} too short, using {:?}",
                config.interval, MIN_INTERVAL
            );
            MIN_INTERVAL
        } else {
            config.interval
        };

        let span = if let Some(hrn) = config.human_readable_name.as_ref() {
            info!(
                "Jobmark: Starting bookmark poller {} with id {} every {:?}",
                hrn, id, interval
            );
            info_span!("Jobmark Bookmark Poller", poller_id = %id, human_readable_name = %hrn)
        } else {
            info!(
                "Jobmark: Starting bookmark poller with id {} every {:?}",
                id, interval
            );
            info_span!("Jobmark Bookmark Poller", poller_id = %id)
        };

        let join = tokio::spawn(
            poll_loop(
                store.clone(),
                view.clone(),
                interval,
                config.follow_changes,
                cancellation_token.clone(),
            )
            .instrument(span),
        );

        Self {
            id,
            store,
            view,
            cancellation_token,
            join,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The view this poller keeps up to date
    pub fn view(&self) -> BookmarkView {
        self.view.clone()
    }

    /// Reload the view right away, without waiting for the next interval
    pub async fn refresh_now(&self) {
        refresh(&self.store, &self.view).await;
    }

    /// Remove a bookmark from the store and drop it from the view immediately.
    ///
    /// The view is only touched when the store write succeeded.
    pub async fn remove_bookmark(&self, id: JobId) -> StoreResult<RemoveOutcome> {
        let outcome = self.store.remove(id).await?;
        self.view.forget(id, self.store.revision());
        Ok(outcome)
    }

    /// Stop polling. The view keeps its last contents.
    pub fn stop(&self) {
        if !self.cancellation_token.is_cancelled() {
            debug!("Jobmark: Stopping bookmark poller with id {}", self.id);
            self.cancellation_token.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    store: BookmarkStore,
    view: BookmarkView,
    interval: Duration,
    follow_changes: bool,
    cancellation_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut changes = store.subscribe();

    'poll_loop: loop {
        select! {
            _ = cancellation_token.cancelled() => {
                info!("Jobmark: Bookmark poller was cancelled");
                break 'poll_loop;
            }
            _ = ticker.tick() => {
                debug!("Jobmark: Polling bookmarks");
                refresh(&store, &view).await;
            }
            changed = changes.changed(), if follow_changes => {
                if changed.is_err() {
                    // the store is gone, nothing will change anymore
                    break 'poll_loop;
                }
                debug!("Jobmark: Store changed, reloading bookmarks");
                refresh(&store, &view).await;
            }
        }
    }
}

async fn refresh(store: &BookmarkStore, view: &BookmarkView) {
    // read the revision first, the list can only be newer than it
    let revision = store.revision();
    let records = store.list().await;
    let count = records.len();
    if view.replace(records, revision) {
        debug!("Jobmark: Bookmark view now holds {} records", count);
    } else {
        debug!(
            "Jobmark: Dropping bookmark list read at revision {}, view is newer",
            revision
        );
    }
}

fn generate_poller_id() -> String {
    format!(
        "jobmark_poller/{}",
        Uuid::new_v4()
            .to_string()
            .chars()
            .take(8)
            .collect::<String>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JobRecord;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_write_elsewhere_visible_within_one_interval() {
        let store = BookmarkStore::in_memory();
        let poller = SyncPoller::start(store.clone(), PollerConfig::default());
        let view = poller.view();
        assert!(view.is_loading());

        sleep(Duration::from_millis(1000)).await;
        assert!(!view.is_loading());
        assert!(view.records().is_empty());
        assert_eq!(view.refresh_count(), 1);

        // the feed view bookmarks a job at t=1000ms
        store.add(JobRecord::new(1)).await.unwrap();
        assert!(view.records().is_empty());

        sleep(Duration::from_millis(5000)).await;
        assert_eq!(view.records(), vec![JobRecord::new(1)]);
        assert_eq!(view.refresh_count(), 2);
        assert!(view.refreshed_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_changes_skips_the_wait() {
        let store = BookmarkStore::in_memory();
        let poller = SyncPoller::start(
            store.clone(),
            PollerConfig::default()
                .with_follow_changes(true)
                .with_human_readable_name("Bookmarks tab"),
        );
        let view = poller.view();
        sleep(Duration::from_millis(10)).await;

        store.add(JobRecord::new(2)).await.unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(view.records(), vec![JobRecord::new(2)]);
        assert_eq!(view.refresh_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_the_view() {
        let store = BookmarkStore::in_memory();
        store.add(JobRecord::new(1)).await.unwrap();
        let poller = SyncPoller::start(store.clone(), PollerConfig::default());
        let view = poller.view();
        sleep(Duration::from_millis(100)).await;

        poller.stop();
        assert!(poller.is_stopped());
        store.add(JobRecord::new(2)).await.unwrap();
        sleep(Duration::from_secs(20)).await;

        assert_eq!(view.records(), vec![JobRecord::new(1)]);
        assert_eq!(view.refresh_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let store = BookmarkStore::in_memory();
        let poller = SyncPoller::start(store.clone(), PollerConfig::default());
        let view = poller.view();
        sleep(Duration::from_millis(100)).await;
        drop(poller);

        store.add(JobRecord::new(1)).await.unwrap();
        sleep(Duration::from_secs(20)).await;
        assert!(view.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_from_bookmark_list() {
        let store = BookmarkStore::in_memory();
        store.add(JobRecord::new(1)).await.unwrap();
        store.add(JobRecord::new(2)).await.unwrap();
        let poller = SyncPoller::start(store.clone(), PollerConfig::default());
        let view = poller.view();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(view.records().len(), 2);

        assert_eq!(
            poller.remove_bookmark(JobId::new(1)).await,
            Ok(RemoveOutcome::Removed)
        );
        assert_eq!(view.records(), vec![JobRecord::new(2)]);
        assert_eq!(store.list().await, vec![JobRecord::new(2)]);

        store.add(JobRecord::new(3)).await.unwrap();
        poller.refresh_now().await;
        assert_eq!(view.records().len(), 2);
        assert!(poller.id().starts_with("jobmark_poller/"));
    }
}
