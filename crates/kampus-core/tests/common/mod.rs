// Scripted gateway for store tests: a `MemoryGateway` with response gates
// and injectable write failures.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use kampus_api::{CollectionGateway, Error, MemoryGateway, Query, Row, RowKey};
use serde_json::{Value, json};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// 503-style, retried by optimistic writes.
    Unavailable,
    /// 400 with a non-constraint code, never retried.
    Rejected,
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Self::Unavailable => Error::Unavailable("scripted outage".into()),
            Self::Rejected => Error::Remote {
                message: "scripted rejection".into(),
                code: Some("PGRST000".into()),
                status: 400,
                details: None,
                hint: None,
            },
        }
    }
}

#[derive(Default)]
pub struct ScriptedGateway {
    inner: MemoryGateway,
    select_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    write_failures: Mutex<VecDeque<Failure>>,
    selects_started: AtomicUsize,
    writes: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(inner: MemoryGateway) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn memory(&self) -> &MemoryGateway {
        &self.inner
    }

    /// The next select to start will read the table immediately and then
    /// hold its response until the returned sender fires (or is dropped).
    pub fn gate_next_select(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.select_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn fail_next_writes(&self, failures: &[Failure]) {
        self.write_failures
            .lock()
            .unwrap()
            .extend(failures.iter().copied());
    }

    pub fn selects_started(&self) -> usize {
        self.selects_started.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Yield until `n` selects have read their rows.
    pub async fn wait_for_selects(&self, n: usize) {
        while self.selects_started() < n {
            tokio::task::yield_now().await;
        }
    }

    fn next_write(&self) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.write_failures.lock().unwrap().pop_front() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

impl CollectionGateway for ScriptedGateway {
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Row>, Error> {
        let result = self.inner.select(collection, query).await;
        let gate = self.select_gates.lock().unwrap().pop_front();
        self.selects_started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<(), Error> {
        self.next_write()?;
        self.inner.insert(collection, row).await
    }

    async fn update(&self, collection: &str, key: &RowKey, patch: Row) -> Result<(), Error> {
        self.next_write()?;
        self.inner.update(collection, key, patch).await
    }

    async fn delete(&self, collection: &str, key: &RowKey) -> Result<(), Error> {
        self.next_write()?;
        self.inner.delete(collection, key).await
    }

    async fn upsert(&self, collection: &str, row: Row, conflict_key: &str) -> Result<(), Error> {
        self.next_write()?;
        self.inner.upsert(collection, row, conflict_key).await
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

pub fn news_row(id: i64, title: &str, views: u64) -> Row {
    row(json!({
        "id": id,
        "title": title,
        "date": "2024-08-17",
        "author": "Humas",
        "category": "kegiatan",
        "image": null,
        "images": [],
        "excerpt": "",
        "content": "<p>isi</p>",
        "published": true,
        "views": views,
        "created_at": format!("2024-08-{:02}T08:00:00Z", id.clamp(1, 28)),
    }))
}

pub fn student_row(id: i64, name: &str) -> Row {
    row(json!({
        "id": id,
        "name": name,
        "nisn": format!("00{id:08}"),
        "class": "X-A",
        "gender": "P"
    }))
}
