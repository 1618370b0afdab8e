// ── Downloadable document ──

use chrono::{DateTime, Utc};
use kampus_api::Order;
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Categorized, Entity, EntityKind, HasBlobs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: EntityId,
    pub title: String,
    pub category: String,
    /// Public URL of the uploaded file.
    pub file_url: String,
    /// Human-readable size, e.g. "1.2 MB".
    #[serde(default)]
    pub size: Option<String>,
    /// File type label, e.g. "PDF".
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: String,
    pub category: String,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl Entity for Document {
    type Key = EntityId;
    type Draft = DocumentDraft;
    type Patch = DocumentPatch;

    const KIND: EntityKind = EntityKind::Document;

    fn key(&self) -> &EntityId {
        &self.id
    }

    fn default_order() -> Order {
        Order::desc("created_at")
    }
}

impl HasBlobs for Document {
    fn blob_urls(&self) -> Vec<&str> {
        vec![self.file_url.as_str()]
    }
}

impl Categorized for Document {
    fn category(&self) -> &str {
        &self.category
    }
}
