use crate::config::DuplicatePolicy;
use crate::error::FeedResult;
use crate::feed::source::Page;
use crate::feed::{FeedState, LoadOutcome, FETCH_ERROR_MESSAGE};
use crate::job_id::JobId;
use crate::record::JobRecord;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Identifies one page request, so a response can be matched to the feed it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Ticket {
    pub page: u32,
    pub generation: u64,
}

pub(super) struct FeedInner {
    state: FeedState,
    page: u32,
    items: Vec<JobRecord>,
    seen: HashSet<JobId>,
    // bumped on reset, responses issued before that are dropped
    generation: u64,
    // the one request that has not answered yet, it outlives a reset
    in_flight: Option<Ticket>,
    duplicates: DuplicatePolicy,
}

impl FeedInner {
    pub(super) fn new(duplicates: DuplicatePolicy) -> Self {
        Self {
            state: FeedState::Idle,
            page: 0,
            items: Vec::new(),
            seen: HashSet::new(),
            generation: 0,
            in_flight: None,
            duplicates,
        }
    }

    pub(super) fn state(&self) -> &FeedState {
        &self.state
    }

    pub(super) fn page(&self) -> u32 {
        self.page
    }

    pub(super) fn items(&self) -> &[JobRecord] {
        &self.items
    }

    pub(super) fn begin_first_page(&mut self) -> Result<Ticket, LoadOutcome> {
        if self.state != FeedState::Idle {
            debug!(
                "Jobmark: Feed already started, state is {:?}",
                self.state
            );
            return Err(LoadOutcome::Skipped(self.state.clone()));
        }
        if let Some(stale) = self.in_flight {
            debug!(
                "Jobmark: Not loading page 1, page {} from before the reset is still in flight",
                stale.page
            );
            return Err(LoadOutcome::Skipped(FeedState::LoadingPage(stale.page)));
        }
        Ok(self.begin_page(1))
    }

    pub(super) fn begin_next_page(&mut self) -> Result<Ticket, LoadOutcome> {
        if self.state != FeedState::Loaded {
            debug!(
                "Jobmark: Not loading page {}, state is {:?}",
                self.page + 1,
                self.state
            );
            return Err(LoadOutcome::Skipped(self.state.clone()));
        }
        Ok(self.begin_page(self.page + 1))
    }

    fn begin_page(&mut self, page: u32) -> Ticket {
        debug!("Jobmark: Loading feed page {}", page);
        self.page = page;
        self.state = FeedState::LoadingPage(page);
        let ticket = Ticket {
            page,
            generation: self.generation,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    pub(super) fn reset(&mut self) {
        info!("Jobmark: Resetting feed");
        self.generation += 1;
        self.state = FeedState::Idle;
        self.page = 0;
        self.items.clear();
        self.seen.clear();
    }

    pub(super) fn complete(&mut self, ticket: Ticket, result: FeedResult<Page>) -> LoadOutcome {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
        if ticket.generation != self.generation {
            debug!(
                "Jobmark: Discarding page {} fetched before the feed was reset",
                ticket.page
            );
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(Page::Records(records)) if !records.is_empty() => {
                let received = records.len();
                let appended = self.append(records);
                self.state = FeedState::Loaded;
                debug!(
                    "Jobmark: Page {} delivered {} records, {} appended, {} total",
                    ticket.page,
                    received,
                    appended,
                    self.items.len()
                );
                LoadOutcome::Loaded {
                    page: ticket.page,
                    appended,
                }
            }
            Ok(page) => {
                info!(
                    "Jobmark: Feed exhausted at page {} ({})",
                    ticket.page,
                    if page == Page::Malformed {
                        "unexpected response shape"
                    } else {
                        "no results"
                    }
                );
                self.state = FeedState::Exhausted;
                LoadOutcome::Exhausted { page: ticket.page }
            }
            Err(err) => {
                warn!("Jobmark: Error fetching page {}: {}", ticket.page, err);
                self.state = FeedState::Failed(FETCH_ERROR_MESSAGE.to_string());
                LoadOutcome::Failed {
                    page: ticket.page,
                    error: err,
                }
            }
        }
    }

    fn append(&mut self, records: Vec<JobRecord>) -> usize {
        let before = self.items.len();
        match self.duplicates {
            DuplicatePolicy::Allow => self.items.extend(records),
            DuplicatePolicy::Reject => {
                for record in records {
                    // records without an id cannot be matched, they are always kept
                    if let Some(id) = record.key() {
                        if !self.seen.insert(id) {
                            continue;
                        }
                    }
                    self.items.push(record);
                }
            }
        }
        self.items.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;

    fn records(ids: std::ops::RangeInclusive<i64>) -> Vec<JobRecord> {
        ids.map(JobRecord::new).collect()
    }

    #[test]
    fn test_new() {
        let inner = FeedInner::new(DuplicatePolicy::Allow);
        assert_eq!(inner.state(), &FeedState::Idle);
        assert_eq!(inner.page(), 0);
        assert!(inner.items().is_empty());
    }

    #[test]
    fn test_next_page_requires_loaded() {
        let mut inner = FeedInner::new(DuplicatePolicy::Allow);
        assert!(matches!(
            inner.begin_next_page(),
            Err(LoadOutcome::Skipped(FeedState::Idle))
        ));

        let ticket = inner.begin_first_page().unwrap();
        assert_eq!(ticket.page, 1);
        assert!(matches!(
            inner.begin_next_page(),
            Err(LoadOutcome::Skipped(FeedState::LoadingPage(1)))
        ));
        assert!(inner.begin_first_page().is_err());

        inner.complete(ticket, Ok(Page::Records(records(1..=3))));
        assert_eq!(inner.begin_next_page().unwrap().page, 2);
    }

    #[test]
    fn test_reject_policy_skips_seen_ids() {
        let mut inner = FeedInner::new(DuplicatePolicy::Reject);
        let ticket = inner.begin_first_page().unwrap();
        inner.complete(ticket, Ok(Page::Records(records(1..=3))));

        let ticket = inner.begin_next_page().unwrap();
        let mut page = records(3..=4);
        page.push(JobRecord::default());
        page.push(JobRecord::default());
        let outcome = inner.complete(ticket, Ok(Page::Records(page)));

        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, appended: 3 });
        assert_eq!(inner.items().len(), 6);
        assert_eq!(inner.state(), &FeedState::Loaded);
    }

    #[test]
    fn test_failure_keeps_items() {
        let mut inner = FeedInner::new(DuplicatePolicy::Allow);
        let ticket = inner.begin_first_page().unwrap();
        inner.complete(ticket, Ok(Page::Records(records(1..=2))));

        let ticket = inner.begin_next_page().unwrap();
        let outcome = inner.complete(ticket, Err(FeedError::Request("timed out".to_string())));

        assert!(matches!(outcome, LoadOutcome::Failed { page: 2, .. }));
        assert_eq!(
            inner.state(),
            &FeedState::Failed(FETCH_ERROR_MESSAGE.to_string())
        );
        assert_eq!(inner.items().len(), 2);
        assert!(inner.begin_next_page().is_err());
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut inner = FeedInner::new(DuplicatePolicy::Allow);
        let stale = inner.begin_first_page().unwrap();
        inner.reset();

        assert_eq!(
            inner.complete(stale, Ok(Page::Records(records(1..=5)))),
            LoadOutcome::Discarded
        );
        assert_eq!(inner.state(), &FeedState::Idle);
        assert!(inner.items().is_empty());
    }

    #[test]
    fn test_first_page_waits_for_request_from_before_reset() {
        let mut inner = FeedInner::new(DuplicatePolicy::Allow);
        let stale = inner.begin_first_page().unwrap();
        inner.reset();

        assert!(matches!(
            inner.begin_first_page(),
            Err(LoadOutcome::Skipped(FeedState::LoadingPage(1)))
        ));
        assert_eq!(inner.state(), &FeedState::Idle);

        inner.complete(stale, Ok(Page::Records(records(1..=5))));
        let ticket = inner.begin_first_page().unwrap();
        assert_eq!(ticket.generation, 1);
        inner.complete(ticket, Ok(Page::Records(records(1..=5))));
        assert_eq!(inner.items().len(), 5);
    }
}
