use std::sync::atomic::{AtomicUsize, Ordering};

use api_types::{
    stats::TransactionStatistics,
    transaction::{Pagination, Transaction},
};
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::filters::Filters;

/// What the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub transactions: Vec<Transaction>,
    pub statistics: Option<TransactionStatistics>,
    pub filters: Filters,
    pub pagination: Pagination,
    pub is_loading: bool,
    /// List-level error banner. Statistics failures never land here.
    pub error: Option<String>,
    pub last_fetched: Option<DateTime<Utc>>,
}

/// Orders responses of one resource by issue order.
#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    issued: u64,
    applied: u64,
}

impl Sequencer {
    pub(crate) fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Marks `seq` as applied. Returns false when a later request already resolved.
    pub(crate) fn apply(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    /// True when no request was issued after `seq`.
    pub(crate) fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued
    }
}

/// Counts a request as outstanding until dropped.
///
/// Dropping the request future before it resolves still releases the count.
#[derive(Debug)]
pub(crate) struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    pub(crate) fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything the store holds for one signed-in identity.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub identity: Option<String>,
    /// Bumped on every identity change; responses carry the generation they
    /// were issued under.
    pub generation: u64,
    pub transactions: Vec<Transaction>,
    pub statistics: Option<TransactionStatistics>,
    pub filters: Filters,
    pub pagination: Pagination,
    pub error: Option<String>,
    pub last_fetched: Option<DateTime<Utc>>,
    pub fetched_at: Option<Instant>,
    pub list_seq: Sequencer,
    pub stats_seq: Sequencer,
}

impl SessionState {
    pub(crate) fn new(identity: Option<String>, generation: u64, page_size: u64) -> Self {
        Self {
            identity,
            generation,
            transactions: Vec::new(),
            statistics: None,
            filters: Filters::with_limit(page_size),
            pagination: Pagination::default(),
            error: None,
            last_fetched: None,
            fetched_at: None,
            list_seq: Sequencer::default(),
            stats_seq: Sequencer::default(),
        }
    }

    /// Drops everything cached for a previous identity.
    ///
    /// Returns true when the state was reset.
    pub(crate) fn sync_identity(&mut self, identity: Option<&str>, page_size: u64) -> bool {
        if self.identity.as_deref() == identity {
            return false;
        }
        tracing::info!(
            from = self.identity.as_deref().unwrap_or("<none>"),
            to = identity.unwrap_or("<none>"),
            "session changed, resetting transaction store"
        );
        *self = Self::new(identity.map(str::to_string), self.generation + 1, page_size);
        true
    }

    pub(crate) fn mark_fetched(&mut self) {
        self.last_fetched = Some(Utc::now());
        self.fetched_at = Some(Instant::now());
    }

    pub(crate) fn snapshot(&self, is_loading: bool) -> StoreSnapshot {
        StoreSnapshot {
            transactions: self.transactions.clone(),
            statistics: self.statistics.clone(),
            filters: self.filters.clone(),
            pagination: self.pagination,
            is_loading,
            error: self.error.clone(),
            last_fetched: self.last_fetched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencer_rejects_older_responses() {
        let mut seq = Sequencer::default();
        let a = seq.issue();
        let b = seq.issue();

        assert!(seq.apply(b));
        assert!(!seq.apply(a));
        assert!(!seq.apply(b));
    }

    #[test]
    fn only_the_last_issued_request_is_latest() {
        let mut seq = Sequencer::default();
        let a = seq.issue();
        assert!(seq.is_latest(a));
        let b = seq.issue();
        assert!(!seq.is_latest(a));
        assert!(seq.is_latest(b));
    }

    #[test]
    fn in_flight_count_is_released_on_drop() {
        let counter = AtomicUsize::new(0);
        let a = InFlight::start(&counter);
        let b = InFlight::start(&counter);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        drop(a);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        drop(b);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn identity_change_resets_state_and_generation() {
        let mut state = SessionState::new(Some("alice".to_string()), 1, 10);
        state.error = Some("boom".to_string());
        state.filters.page = 3;

        assert!(!state.sync_identity(Some("alice"), 10));
        assert_eq!(state.filters.page, 3);

        assert!(state.sync_identity(Some("bob"), 10));
        assert_eq!(state.generation, 2);
        assert_eq!(state.filters.page, 1);
        assert!(state.error.is_none());
        assert!(state.fetched_at.is_none());
    }
}
