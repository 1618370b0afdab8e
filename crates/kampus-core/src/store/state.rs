// ── Observable store state ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::config::FetchOrdering;

/// Point-in-time view of one store.
///
/// `items` is replaced wholesale by every applied fetch; entities inside are
/// shared read-only snapshots.
#[derive(Debug)]
pub struct StoreState<E> {
    pub items: Arc<Vec<Arc<E>>>,
    /// True while at least one fetch is outstanding, and from construction
    /// until the first fetch settles.
    pub loading: bool,
    /// Bumped on every change to `items` (fetch, local patch, rollback).
    pub revision: u64,
    /// When the current `items` were last replaced by a fetch.
    pub fetched_at: Option<DateTime<Utc>>,
    pending: usize,
    applied_seq: u64,
}

impl<E> Clone for StoreState<E> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            loading: self.loading,
            revision: self.revision,
            fetched_at: self.fetched_at,
            pending: self.pending,
            applied_seq: self.applied_seq,
        }
    }
}

impl<E> Default for StoreState<E> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            loading: true,
            revision: 0,
            fetched_at: None,
            pending: 0,
            applied_seq: 0,
        }
    }
}

impl<E> StoreState<E> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of fetches currently in flight.
    pub fn pending_fetches(&self) -> usize {
        self.pending
    }
}

// ── Pending fetch guard ──────────────────────────────────────────────

/// Marks one fetch as outstanding for as long as it lives.
///
/// Dropping the guard without [`finish`](Self::finish) (the fetch failed or
/// its future was cancelled) still releases the loading flag.
pub(crate) struct PendingFetch<'a, E> {
    state: &'a watch::Sender<StoreState<E>>,
    seq: u64,
    settled: bool,
}

impl<'a, E> PendingFetch<'a, E> {
    pub(crate) fn begin(state: &'a watch::Sender<StoreState<E>>, seq: u64) -> Self {
        state.send_modify(|s| {
            s.pending += 1;
            s.loading = true;
        });
        Self {
            state,
            seq,
            settled: false,
        }
    }

    /// Settle the fetch with its result. Returns `false` when the response
    /// was stale under `ordering` and discarded.
    pub(crate) fn finish(mut self, items: Vec<Arc<E>>, ordering: FetchOrdering) -> bool {
        let seq = self.seq;
        let mut applied = false;
        self.state.send_modify(|s| {
            release(s);
            let fresh = match ordering {
                FetchOrdering::LatestIssued => seq > s.applied_seq,
                FetchOrdering::LastResolved => true,
            };
            if fresh {
                s.items = Arc::new(items);
                s.applied_seq = s.applied_seq.max(seq);
                s.revision += 1;
                s.fetched_at = Some(Utc::now());
                applied = true;
            }
        });
        self.settled = true;
        applied
    }
}

impl<E> Drop for PendingFetch<'_, E> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.send_modify(release);
        }
    }
}

fn release<E>(s: &mut StoreState<E>) {
    s.pending = s.pending.saturating_sub(1);
    s.loading = s.pending > 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_loading_and_empty() {
        let state: StoreState<u8> = StoreState::default();
        assert!(state.loading);
        assert!(state.is_empty());
        assert_eq!(state.revision, 0);
    }

    #[test]
    fn dropped_guard_clears_loading() {
        let (tx, rx) = watch::channel(StoreState::<u8>::default());
        {
            let _guard = PendingFetch::begin(&tx, 1);
            assert_eq!(rx.borrow().pending_fetches(), 1);
        }
        assert!(!rx.borrow().loading);
        assert_eq!(rx.borrow().revision, 0);
    }

    #[test]
    fn stale_sequence_is_discarded_when_latest_issued() {
        let (tx, rx) = watch::channel(StoreState::<u8>::default());
        let older = PendingFetch::begin(&tx, 1);
        let newer = PendingFetch::begin(&tx, 2);

        assert!(newer.finish(vec![Arc::new(2)], FetchOrdering::LatestIssued));
        assert!(rx.borrow().loading);
        assert!(!older.finish(vec![Arc::new(1)], FetchOrdering::LatestIssued));

        let state = rx.borrow();
        assert!(!state.loading);
        assert_eq!(*state.items[0], 2);
    }

    #[test]
    fn last_resolved_applies_late_response() {
        let (tx, rx) = watch::channel(StoreState::<u8>::default());
        let older = PendingFetch::begin(&tx, 1);
        let newer = PendingFetch::begin(&tx, 2);

        assert!(newer.finish(vec![Arc::new(2)], FetchOrdering::LastResolved));
        assert!(older.finish(vec![Arc::new(1)], FetchOrdering::LastResolved));
        assert_eq!(*rx.borrow().items[0], 1);
    }
}
