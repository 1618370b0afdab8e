// Gateway contracts
//
// Everything above this crate talks to the remote service through these two
// traits. Rows travel as untyped JSON objects; typing happens in the core
// crate's entity model.

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::query::Query;

/// A single remote row: a JSON object keyed by column name.
pub type Row = Map<String, Value>;

/// Identifies one row by the value of a unique column.
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey {
    pub column: String,
    pub value: Value,
}

impl RowKey {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Shorthand for the surrogate `id` column.
    pub fn id(value: impl Into<Value>) -> Self {
        Self::new("id", value)
    }

    /// Whether `row` carries this key.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column, crate::query::param_value(&self.value))
    }
}

/// Remote collection service: select / insert / update / delete / upsert
/// over named collections.
///
/// Writes acknowledge without returning the written row; callers that need
/// the resulting state re-read the collection.
pub trait CollectionGateway: Send + Sync + 'static {
    /// All rows of `collection` matching `query`, in the requested order.
    fn select(
        &self,
        collection: &str,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Row>, Error>> + Send;

    /// Insert one row. The service assigns identifiers and defaults.
    fn insert(&self, collection: &str, row: Row) -> impl Future<Output = Result<(), Error>> + Send;

    /// Write `patch` onto the row identified by `key`. Columns absent from
    /// the patch are left untouched.
    fn update(
        &self,
        collection: &str,
        key: &RowKey,
        patch: Row,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Remove the row identified by `key`.
    fn delete(&self, collection: &str, key: &RowKey)
    -> impl Future<Output = Result<(), Error>> + Send;

    /// Insert `row`, or merge it into the existing row whose `conflict_key`
    /// column holds the same value. Only columns present in `row` are written.
    fn upsert(
        &self,
        collection: &str,
        row: Row,
        conflict_key: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Remote blob storage scoped to one bucket.
pub trait BlobStorage: Send + Sync + 'static {
    /// Upload `body` to `path`, returning its public URL.
    fn upload(
        &self,
        path: &str,
        body: Bytes,
        content_type: &str,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Public URL for an object path. Pure; does not check existence.
    fn public_url(&self, path: &str) -> String;

    /// Remove the given object paths.
    fn remove(&self, paths: &[String]) -> impl Future<Output = Result<(), Error>> + Send;

    /// Reverse a public URL produced by [`public_url`](Self::public_url) back
    /// into its object path. `None` for URLs outside this bucket.
    fn path_from_url(&self, url: &str) -> Option<String> {
        let prefix = self.public_url("");
        let path = url.strip_prefix(prefix.as_str())?;
        let path = path.split(['?', '#']).next().unwrap_or_default();
        (!path.is_empty()).then(|| path.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_key_matches_on_column_value() {
        let key = RowKey::id(7);
        let mut row = Row::new();
        row.insert("id".into(), json!(7));
        assert!(key.matches(&row));

        row.insert("id".into(), json!("7"));
        assert!(!key.matches(&row));
    }

    #[test]
    fn row_key_display() {
        assert_eq!(RowKey::new("section_key", "fasilitas").to_string(), "section_key=fasilitas");
    }
}
