// In-process gateways
//
// `MemoryGateway` behaves like the remote collection service closely enough
// for the store layer to be exercised without a network: it assigns ids and
// creation timestamps, enforces declared not-null columns (reporting SQLSTATE
// 23502 like the real service), merges upserts, and honours filters and
// ordering. `MemoryStorage` does the same for blobs.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::gateway::{BlobStorage, CollectionGateway, Row, RowKey};
use crate::query::{Direction, FilterOp, Query};

/// In-memory collection service.
#[derive(Default)]
pub struct MemoryGateway {
    tables: DashMap<String, Vec<Row>>,
    /// Columns that must be present and non-null on insert, per collection.
    required: DashMap<String, Vec<String>>,
    offline: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare not-null columns for `collection`.
    pub fn with_required(self, collection: &str, columns: &[&str]) -> Self {
        self.required.insert(
            collection.to_owned(),
            columns.iter().map(|c| (*c).to_owned()).collect(),
        );
        self
    }

    /// Replace the contents of `collection` verbatim (no id assignment).
    pub fn seed(&self, collection: &str, rows: Vec<Row>) {
        self.tables.insert(collection.to_owned(), rows);
    }

    /// Raw rows of `collection` in insertion order.
    pub fn rows(&self, collection: &str) -> Vec<Row> {
        self.tables
            .get(collection)
            .map(|t| t.value().clone())
            .unwrap_or_default()
    }

    /// Simulate the service going away: every call fails with
    /// [`Error::Unavailable`] until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), Error> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(Error::Unavailable("memory gateway is offline".into()));
        }
        Ok(())
    }

    fn check_required(&self, collection: &str, row: &Row) -> Result<(), Error> {
        let Some(columns) = self.required.get(collection) else {
            return Ok(());
        };
        for column in columns.value() {
            if row.get(column).is_none_or(Value::is_null) {
                return Err(Error::Remote {
                    message: format!(
                        "null value in column \"{column}\" of relation \"{collection}\" violates not-null constraint"
                    ),
                    code: Some("23502".into()),
                    status: 400,
                    details: None,
                    hint: None,
                });
            }
        }
        Ok(())
    }

    /// Fill service-assigned defaults on a fresh row.
    fn with_defaults(mut row: Row) -> Row {
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        row
    }
}

impl CollectionGateway for MemoryGateway {
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Row>, Error> {
        self.ensure_online()?;
        let mut rows: Vec<Row> = self
            .rows(collection)
            .into_iter()
            .filter(|row| {
                query.filters.iter().all(|f| {
                    let ord = compare(row.get(&f.column), Some(&f.value));
                    match f.op {
                        FilterOp::Eq => row.get(&f.column) == Some(&f.value),
                        FilterOp::Neq => row.get(&f.column) != Some(&f.value),
                        FilterOp::Gt => ord == Ordering::Greater,
                        FilterOp::Gte => ord != Ordering::Less,
                        FilterOp::Lt => ord == Ordering::Less,
                        FilterOp::Lte => ord != Ordering::Greater,
                    }
                })
            })
            .collect();

        if let Some(ref order) = query.order {
            // Stable sort: ties keep insertion order.
            rows.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        debug!(collection, rows = rows.len(), "memory select");
        Ok(rows)
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<(), Error> {
        self.ensure_online()?;
        let row = Self::with_defaults(row);
        self.check_required(collection, &row)?;
        self.tables
            .entry(collection.to_owned())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn update(&self, collection: &str, key: &RowKey, patch: Row) -> Result<(), Error> {
        self.ensure_online()?;
        if let Some(mut table) = self.tables.get_mut(collection) {
            for row in table.iter_mut().filter(|r| key.matches(r)) {
                row.extend(patch.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &RowKey) -> Result<(), Error> {
        self.ensure_online()?;
        if let Some(mut table) = self.tables.get_mut(collection) {
            table.retain(|r| !key.matches(r));
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, row: Row, conflict_key: &str) -> Result<(), Error> {
        self.ensure_online()?;
        let Some(value) = row.get(conflict_key).cloned() else {
            return Err(Error::Remote {
                message: format!("upsert row is missing conflict column \"{conflict_key}\""),
                code: Some("23502".into()),
                status: 400,
                details: None,
                hint: None,
            });
        };
        let key = RowKey::new(conflict_key, value);

        let mut table = self.tables.entry(collection.to_owned()).or_default();
        if let Some(existing) = table.iter_mut().find(|r| key.matches(r)) {
            existing.extend(row);
            return Ok(());
        }

        let row = Self::with_defaults(row);
        self.check_required(collection, &row)?;
        table.push(row);
        Ok(())
    }
}

/// Total order over JSON scalars; absent and null sort last.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

// ── Blob storage ─────────────────────────────────────────────────────

/// In-memory blob bucket.
pub struct MemoryStorage {
    bucket: String,
    objects: DashMap<String, Bytes>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: DashMap::new(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl BlobStorage for MemoryStorage {
    async fn upload(&self, path: &str, body: Bytes, _content_type: &str) -> Result<String, Error> {
        let path = path.trim_start_matches('/');
        if self.objects.contains_key(path) {
            return Err(Error::Storage {
                message: "The resource already exists".into(),
                status: 409,
            });
        }
        self.objects.insert(path.to_owned(), body);
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{}", self.bucket, path.trim_start_matches('/'))
    }

    async fn remove(&self, paths: &[String]) -> Result<(), Error> {
        for path in paths {
            self.objects.remove(path.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::{Filter, Order};
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamp() {
        let gw = MemoryGateway::new();
        gw.insert("news", row(json!({ "title": "Hello" })))
            .await
            .unwrap();

        let rows = gw.select("news", &Query::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("id").is_some_and(Value::is_string));
        assert!(rows[0].contains_key("created_at"));
    }

    #[tokio::test]
    async fn select_filters_and_orders() {
        let gw = MemoryGateway::new();
        gw.seed(
            "students",
            vec![
                row(json!({ "id": 1, "name": "Citra", "class": "X-A" })),
                row(json!({ "id": 2, "name": "Andi", "class": "X-B" })),
                row(json!({ "id": 3, "name": "Budi", "class": "X-A" })),
            ],
        );

        let query = Query::new()
            .filter(Filter::eq("class", "X-A"))
            .order(Order::asc("name"));
        let names: Vec<_> = gw
            .select("students", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("Budi"), json!("Citra")]);
    }

    #[tokio::test]
    async fn required_column_rejects_insert() {
        let gw = MemoryGateway::new().with_required("content_sections", &["title"]);
        let err = gw
            .upsert(
                "content_sections",
                row(json!({ "section_key": "fasilitas", "content": "Lab" })),
                "section_key",
            )
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation(), "got {err:?}");
        assert!(gw.rows("content_sections").is_empty());
    }

    #[tokio::test]
    async fn upsert_merges_existing_row() {
        let gw = MemoryGateway::new().with_required("content_sections", &["title"]);
        gw.upsert(
            "content_sections",
            row(json!({ "section_key": "visi", "title": "Visi", "content": "a" })),
            "section_key",
        )
        .await
        .unwrap();
        gw.upsert(
            "content_sections",
            row(json!({ "section_key": "visi", "content": "b" })),
            "section_key",
        )
        .await
        .unwrap();

        let rows = gw.rows("content_sections");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("Visi"));
        assert_eq!(rows[0]["content"], json!("b"));
    }

    #[tokio::test]
    async fn offline_gateway_fails_every_call() {
        let gw = MemoryGateway::new();
        gw.set_offline(true);
        let err = gw.select("news", &Query::new()).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn storage_round_trips_paths() {
        let storage = MemoryStorage::new("media");
        let url = storage
            .upload("gallery/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "memory://media/gallery/a.png");

        let path = storage.path_from_url(&url).unwrap();
        storage.remove(&[path]).await.unwrap();
        assert!(storage.is_empty());
    }
}
