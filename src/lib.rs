//! Core of a job listing client.
//!
//! * [`store::BookmarkStore`] keeps bookmarked jobs durably, one record per id.
//! * [`feed::FeedPaginator`] loads the remote job feed page by page into one growing list.
//! * [`projection::BookmarkProjection`] answers "is this job bookmarked" for the feed,
//!   and [`projection::toggle_bookmark`] flips it.
//! * [`poller::SyncPoller`] keeps a second, read-only bookmark list fresh.
//!
//! ```no_run
//! use jobmark::config::{FeedConfig, PollerConfig};
//! use jobmark::feed::FeedPaginator;
//! use jobmark::poller::SyncPoller;
//! use jobmark::projection::{toggle_bookmark, BookmarkProjection};
//! use jobmark::store::BookmarkStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BookmarkStore::in_memory();
//! let feed = FeedPaginator::over_http(&FeedConfig::default());
//! let mut projection = BookmarkProjection::load(&store).await;
//! let bookmarks_tab = SyncPoller::start(store.clone(), PollerConfig::default());
//!
//! feed.start().await?;
//! if let Some(first) = feed.items()?.first() {
//!     toggle_bookmark(&store, &mut projection, first).await?;
//! }
//! for entry in projection.annotate(&feed.items()?) {
//!     tracing::info!("{} bookmarked={}", entry.record.display_title(), entry.bookmarked);
//! }
//! let _shown = bookmarks_tab.view().records();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod job_id;
pub mod poller;
pub mod projection;
pub mod record;
pub mod store;

pub use error::{FeedError, FeedResult, StoreError, StoreResult};
pub use job_id::JobId;
pub use record::{JobRecord, PrimaryDetails};
