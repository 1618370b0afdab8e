// ── Free-form content sections ──
//
// Page fragments ("visi", "fasilitas", ...) keyed by a caller-chosen string.
// Writes are upserts on `section_key`; a key that does not exist yet needs a
// title on its first write or the service rejects the row.

use chrono::{DateTime, Utc};
use kampus_api::Order;
use serde::{Deserialize, Serialize};

use super::{Entity, EntityKind, WriteMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub section_key: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSectionDraft {
    pub section_key: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContentSectionPatch {
    /// Patch that sets `content` (and `title` when given). The store
    /// stamps `updated_at` on write.
    pub fn content(content: impl Into<String>, title: Option<String>) -> Self {
        Self {
            title,
            content: Some(content.into()),
            updated_at: None,
        }
    }
}

impl Entity for ContentSection {
    type Key = String;
    type Draft = ContentSectionDraft;
    type Patch = ContentSectionPatch;

    const KIND: EntityKind = EntityKind::ContentSection;
    const KEY_COLUMN: &'static str = "section_key";
    const WRITE_MODE: WriteMode = WriteMode::UpsertByKey;
    const STAMP_COLUMN: Option<&'static str> = Some("updated_at");

    fn key(&self) -> &String {
        &self.section_key
    }

    fn default_order() -> Order {
        Order::asc("section_key")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn content_patch_leaves_title_out_when_absent() {
        let patch = ContentSectionPatch::content("Lab komputer", None);
        let value = serde_json::to_value(patch).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("title"));
        assert_eq!(obj["content"], "Lab komputer");
        assert!(!obj.contains_key("updated_at"));
    }
}
