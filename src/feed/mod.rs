mod inner;
pub mod source;

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::feed::inner::{FeedInner, Ticket};
use crate::record::JobRecord;
use source::{HttpPageSource, PageSource};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Message shown to the user when a page could not be fetched
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching jobs";

/// Where the paginator is in its life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    /// Nothing requested yet
    Idle,
    /// A request for the given page is in flight
    LoadingPage(u32),
    /// The last page delivered records, more may follow
    Loaded,
    /// The last page was empty or malformed, no more pages will be requested
    Exhausted,
    /// The last request failed, needs a reload
    Failed(String),
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedState::LoadingPage(_))
    }

    /// Whether further pages may still be requested without a reset
    pub fn has_more(&self) -> bool {
        matches!(self, FeedState::Idle | FeedState::LoadingPage(_) | FeedState::Loaded)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FeedState::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// The first page is loading and there is nothing to show yet
    pub fn shows_initial_spinner(&self) -> bool {
        *self == FeedState::LoadingPage(1)
    }

    /// A later page is loading below the already rendered records
    pub fn shows_footer_spinner(&self) -> bool {
        matches!(self, FeedState::LoadingPage(page) if *page > 1)
    }
}

/// What a load request ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The page delivered records, `appended` of them were added to the list
    Loaded { page: u32, appended: usize },
    /// The page was empty or malformed
    Exhausted { page: u32 },
    /// The request failed, the feed is now in [`FeedState::Failed`]
    Failed { page: u32, error: FeedError },
    /// No request was made because of the state the feed was in
    Skipped(FeedState),
    /// The consumer is not close enough to the end of the list
    NotNearEnd,
    /// The feed was reset while the request was in flight, its result was dropped
    Discarded,
}

/// Scroll geometry reported by the list that renders the feed.
///
/// All three values must use the same unit, pixels or rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    /// Distance scrolled from the top of the content
    pub offset: f64,
    /// Visible length of the list
    pub viewport: f64,
    /// Total length of the rendered content
    pub content: f64,
}

impl ScrollPosition {
    pub fn new(offset: f64, viewport: f64, content: f64) -> Self {
        Self {
            offset,
            viewport,
            content,
        }
    }

    /// Unrendered content left below the visible part of the list
    pub fn distance_from_end(&self) -> f64 {
        self.content - (self.offset + self.viewport)
    }

    /// Whether what is left below the viewport is at most `threshold` viewport lengths
    pub fn is_near_end(&self, threshold: f64) -> bool {
        self.viewport > 0.0 && self.distance_from_end() <= threshold * self.viewport
    }
}

/// Incrementally loads the paged job feed into one growing list.
///
/// Pages are requested one at a time, starting at page 1. Records are appended
/// in arrival order. An empty or malformed page ends the feed, a failed request
/// stops it until [`FeedPaginator::reload`] is called.
///
/// The paginator can be shared across tasks using `.clone()`
#[derive(Clone)]
pub struct FeedPaginator {
    inner: Arc<Mutex<FeedInner>>,
    source: Arc<dyn PageSource>,
    load_more_threshold: f64,
}

impl FeedPaginator {
    /// Create a paginator reading pages from `source`
    ///
    /// # Arguments
    ///
    /// * `source` - Where pages come from
    /// * `config` - Load more threshold and duplicate policy, the base url is not used
    pub fn new(source: impl PageSource, config: &FeedConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedInner::new(config.duplicates))),
            source: Arc::new(source),
            load_more_threshold: config.load_more_threshold,
        }
    }

    /// Create a paginator fetching pages over HTTP from `config.base_url`
    pub fn over_http(config: &FeedConfig) -> Self {
        Self::new(HttpPageSource::new(config.base_url.clone()), config)
    }

    /// Request the first page. Does nothing unless the feed is idle.
    pub async fn start(&self) -> FeedResult<LoadOutcome> {
        let ticket = {
            let mut inner = self.lock("start")?;
            match inner.begin_first_page() {
                Ok(ticket) => ticket,
                Err(outcome) => return Ok(outcome),
            }
        };
        self.fetch(ticket).await
    }

    /// Request the next page.
    ///
    /// Does nothing while a page is loading, after the feed is exhausted or failed,
    /// or before it was started.
    pub async fn load_more(&self) -> FeedResult<LoadOutcome> {
        let ticket = {
            let mut inner = self.lock("load_more")?;
            match inner.begin_next_page() {
                Ok(ticket) => ticket,
                Err(outcome) => return Ok(outcome),
            }
        };
        self.fetch(ticket).await
    }

    /// Load the next page if the consumer scrolled close enough to the end of the list
    pub async fn on_scroll(&self, position: ScrollPosition) -> FeedResult<LoadOutcome> {
        if !position.is_near_end(self.load_more_threshold) {
            return Ok(LoadOutcome::NotNearEnd);
        }
        self.load_more().await
    }

    /// Drop everything loaded so far and request page 1 again.
    ///
    /// While a request made before the reset is still outstanding no new one is
    /// sent, the result is `Skipped(LoadingPage(..))` and the feed stays idle.
    pub async fn reload(&self) -> FeedResult<LoadOutcome> {
        self.reset()?;
        self.start().await
    }

    /// Drop everything loaded so far and go back to idle.
    ///
    /// Responses to requests made before the reset are discarded when they arrive.
    pub fn reset(&self) -> FeedResult<()> {
        self.lock("reset")?.reset();
        Ok(())
    }

    pub fn state(&self) -> FeedResult<FeedState> {
        Ok(self.lock("state")?.state().clone())
    }

    /// The last page requested, 0 before the feed was started
    pub fn page(&self) -> FeedResult<u32> {
        Ok(self.lock("page")?.page())
    }

    /// All records accumulated so far, in arrival order
    pub fn items(&self) -> FeedResult<Vec<JobRecord>> {
        Ok(self.lock("items")?.items().to_vec())
    }

    async fn fetch(&self, ticket: Ticket) -> FeedResult<LoadOutcome> {
        let result = self.source.fetch_page(ticket.page).await;
        let mut inner = self.lock("fetch")?;
        Ok(inner.complete(ticket, result))
    }

    fn lock(&self, operation: &str) -> FeedResult<MutexGuard<'_, FeedInner>> {
        self.inner.lock().map_err(|err| {
            warn!("Jobmark: Mutex error on {}: {}", operation, err);
            FeedError::MutexError(err.to_string())
        })
    }
}
