// ── Generic entity store ──
//
// One instance per entity kind. Holds the last fetched snapshot of a remote
// collection in a `watch` channel and routes every write through the
// gateway, re-reading the whole collection once the write is acknowledged.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use kampus_api::{CollectionGateway, Query, Row, RowKey};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::state::{PendingFetch, StoreState};
use crate::config::{FetchOrdering, RetryPolicy};
use crate::error::CoreError;
use crate::model::{Entity, WriteMode};
use crate::stream::EntityStream;

/// Result of an explicit [`refresh`](EntityStore::refresh).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced `items`.
    Applied,
    /// A newer fetch had already been applied; this response was dropped.
    Stale,
}

/// Client-side cache of one remote collection.
///
/// Reads never fail: [`fetch_all`](Self::fetch_all) logs gateway errors and
/// keeps the last known items. Writes return the gateway error to the
/// caller and leave `items` untouched; on success they finish by
/// re-fetching the collection, so a returned `Ok(())` means `items` reflects
/// the remote state after the write.
pub struct EntityStore<E: Entity, G> {
    gateway: Arc<G>,
    collection: String,
    state: watch::Sender<StoreState<E>>,
    next_seq: AtomicU64,
    ordering: FetchOrdering,
    pub(crate) retry: RetryPolicy,
}

impl<E: Entity, G: CollectionGateway> EntityStore<E, G> {
    pub fn new(gateway: Arc<G>, collection: impl Into<String>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            gateway,
            collection: collection.into(),
            state,
            next_seq: AtomicU64::new(0),
            ordering: FetchOrdering::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_ordering(mut self, ordering: FetchOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Retry schedule used by [`optimistic_update`](Self::optimistic_update).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn ordering(&self) -> FetchOrdering {
        self.ordering
    }

    // ── Read access ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> StoreState<E> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Arc<Vec<Arc<E>>> {
        Arc::clone(&self.state.borrow().items)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().fetched_at
    }

    /// Look up an entity in the current snapshot. Never touches the network.
    pub fn find_by_id(&self, key: &E::Key) -> Option<Arc<E>> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|e| e.key() == key)
            .map(Arc::clone)
    }

    /// Entities in the current snapshot matching `predicate`, in store order.
    pub fn filtered(&self, predicate: impl Fn(&E) -> bool) -> Vec<Arc<E>> {
        self.state
            .borrow()
            .items
            .iter()
            .filter(|e| predicate(e))
            .map(Arc::clone)
            .collect()
    }

    pub fn subscribe(&self) -> EntityStream<E> {
        EntityStream::new(self.state.subscribe())
    }

    /// Wait until no fetch is outstanding and return that state.
    ///
    /// A store that has never been fetched counts as loading, so this
    /// waits for the first fetch even when none is in flight yet.
    pub async fn ready(&self) -> StoreState<E> {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    // ── Fetch ────────────────────────────────────────────────────────

    /// Re-read the whole collection in its default order.
    ///
    /// Failures are logged and swallowed: `items` keeps its previous value
    /// and `loading` is cleared either way.
    pub async fn fetch_all(&self) {
        if let Err(e) = self.refresh().await {
            warn!(
                kind = %E::KIND,
                collection = %self.collection,
                error = %e,
                "fetch failed, keeping last known items"
            );
        }
    }

    /// Like [`fetch_all`](Self::fetch_all) but reports the failure.
    pub async fn refresh(&self) -> Result<FetchOutcome, CoreError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let pending = PendingFetch::begin(&self.state, seq);
        let query = Query::new().order(E::default_order());

        debug!(kind = %E::KIND, collection = %self.collection, seq, "fetch started");
        let rows = self.gateway.select(&self.collection, &query).await?;
        let items = decode_rows::<E>(rows)?;
        let count = items.len();

        if pending.finish(items, self.ordering) {
            debug!(kind = %E::KIND, seq, count, "fetch applied");
            Ok(FetchOutcome::Applied)
        } else {
            warn!(kind = %E::KIND, seq, "discarding stale fetch response");
            Ok(FetchOutcome::Stale)
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert a new row, then re-fetch.
    pub async fn add(&self, draft: &E::Draft) -> Result<(), CoreError> {
        let mut row = to_row(draft)?;
        stamp::<E>(&mut row);
        debug!(kind = %E::KIND, collection = %self.collection, "add");
        self.gateway.insert(&self.collection, row).await?;
        self.fetch_all().await;
        Ok(())
    }

    /// Write `patch` to the entity identified by `key`, then re-fetch.
    ///
    /// For upsert-by-key kinds the row is created when `key` does not exist
    /// yet; the service rejects it if required columns are missing from
    /// `patch`.
    pub async fn update(&self, key: &E::Key, patch: &E::Patch) -> Result<(), CoreError> {
        let row = to_row(patch)?;
        self.write(key, row).await?;
        self.fetch_all().await;
        Ok(())
    }

    /// Remove the entity identified by `key`, then re-fetch.
    ///
    /// Blobs the entity references are left in storage; see
    /// [`crate::blob::delete_with_blobs`].
    pub async fn delete(&self, key: &E::Key) -> Result<(), CoreError> {
        let key = row_key::<E>(key)?;
        debug!(kind = %E::KIND, collection = %self.collection, %key, "delete");
        self.gateway.delete(&self.collection, &key).await?;
        self.fetch_all().await;
        Ok(())
    }

    /// Send one patch row to the gateway according to the kind's write mode.
    pub(crate) async fn write(&self, key: &E::Key, mut row: Row) -> Result<(), CoreError> {
        match E::WRITE_MODE {
            WriteMode::ById => {
                if row.is_empty() {
                    return Err(CoreError::ValidationFailed {
                        message: format!("empty update for {} {key}", E::KIND),
                    });
                }
                stamp::<E>(&mut row);
                let key = row_key::<E>(key)?;
                debug!(kind = %E::KIND, collection = %self.collection, %key, "update");
                self.gateway.update(&self.collection, &key, row).await?;
            }
            WriteMode::UpsertByKey => {
                row.insert(E::KEY_COLUMN.to_owned(), serde_json::to_value(key)?);
                stamp::<E>(&mut row);
                debug!(kind = %E::KIND, collection = %self.collection, %key, "upsert");
                self.gateway
                    .upsert(&self.collection, row, E::KEY_COLUMN)
                    .await?;
            }
        }
        Ok(())
    }

    pub(crate) fn state(&self) -> &watch::Sender<StoreState<E>> {
        &self.state
    }
}

// ── Row conversion ───────────────────────────────────────────────────

fn decode_rows<E: Entity>(rows: Vec<Row>) -> Result<Vec<Arc<E>>, CoreError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<E>(Value::Object(row))
                .map(Arc::new)
                .map_err(|e| CoreError::Serialization {
                    message: format!("malformed {} row: {e}", E::KIND),
                })
        })
        .collect()
}

pub(crate) fn to_row<T: Serialize + ?Sized>(value: &T) -> Result<Row, CoreError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(CoreError::Serialization {
            message: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Fill the kind's stamp column with the current time unless the row sets it.
fn stamp<E: Entity>(row: &mut Row) {
    if let Some(column) = E::STAMP_COLUMN {
        row.entry(column)
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    }
}

fn row_key<E: Entity>(key: &E::Key) -> Result<RowKey, CoreError> {
    Ok(RowKey::new(E::KEY_COLUMN, serde_json::to_value(key)?))
}
