// ── Reactive entity streams ──
//
// Subscription types for consuming store changes.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::StoreState;

pub use filter::{AchievementFilter, DocumentFilter, NewsFilter, StudentFilter};

/// A subscription to one store.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via `changed()` or by converting to a `Stream`.
pub struct EntityStream<E> {
    current: Arc<Vec<Arc<E>>>,
    receiver: watch::Receiver<StoreState<E>>,
}

impl<E: Send + Sync + 'static> EntityStream<E> {
    pub(crate) fn new(receiver: watch::Receiver<StoreState<E>>) -> Self {
        let current = Arc::clone(&receiver.borrow().items);
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or at the last
    /// `changed()`).
    pub fn current(&self) -> &Arc<Vec<Arc<E>>> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Arc<E>>> {
        Arc::clone(&self.receiver.borrow().items)
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().loading
    }

    /// Wait for the next state change, returning the new items.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<E>>>> {
        self.receiver.changed().await.ok()?;
        let snap = Arc::clone(&self.receiver.borrow_and_update().items);
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` of full store states.
    pub fn into_stream(self) -> EntityWatchStream<E> {
        EntityWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current state first, then a new state each time the store
/// changes (fetch applied, loading toggled, local patch).
pub struct EntityWatchStream<E> {
    inner: WatchStream<StoreState<E>>,
}

impl<E: Send + Sync + 'static> Stream for EntityWatchStream<E> {
    type Item = StoreState<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
