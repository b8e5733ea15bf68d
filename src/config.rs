use std::time::Duration;

/// Storage key the bookmark collection is persisted under
pub const BOOKMARKS_KEY: &str = "bookmarked_jobs";

/// Endpoint of the public job feed
pub const DEFAULT_FEED_URL: &str = "https://testapi.getlokalapp.com/common/jobs";

pub const DEFAULT_LOAD_MORE_THRESHOLD: f64 = 0.5;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// What to do with a record whose id is already present in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep every record, even if the id was seen before
    Allow,
    /// Keep only the first record for each id
    Reject,
}

/// Configuration of a [`crate::store::BookmarkStore`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub key: String,
    pub duplicates: DuplicatePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: BOOKMARKS_KEY.to_string(),
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

impl StoreConfig {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }
}

/// Configuration of a [`crate::feed::FeedPaginator`]
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    /// How close to the end of the rendered list, in viewport lengths, the next page is requested
    pub load_more_threshold: f64,
    pub duplicates: DuplicatePolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            load_more_threshold: DEFAULT_LOAD_MORE_THRESHOLD,
            duplicates: DuplicatePolicy::Allow,
        }
    }
}

impl FeedConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_load_more_threshold(mut self, threshold: f64) -> Self {
        self.load_more_threshold = threshold.max(0.0);
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }
}

/// Configuration of a [`crate::poller::SyncPoller`]
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Also refresh as soon as the store reports a write
    pub follow_changes: bool,
    /// Will appear in the tracing logs
    pub human_readable_name: Option<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            follow_changes: false,
            human_readable_name: None,
        }
    }
}

impl PollerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_follow_changes(mut self, follow_changes: bool) -> Self {
        self.follow_changes = follow_changes;
        self
    }

    pub fn with_human_readable_name(mut self, name: impl Into<String>) -> Self {
        self.human_readable_name = Some(name.into());
        self
    }
}
