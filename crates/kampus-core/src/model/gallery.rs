// ── Gallery photo ──

use chrono::{DateTime, Utc};
use kampus_api::Order;
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Categorized, Entity, EntityKind, HasBlobs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: EntityId,
    pub title: String,
    pub category: String,
    /// Public URL of the uploaded photo.
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryDraft {
    pub title: String,
    pub category: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Entity for GalleryItem {
    type Key = EntityId;
    type Draft = GalleryDraft;
    type Patch = GalleryPatch;

    const KIND: EntityKind = EntityKind::Gallery;

    fn key(&self) -> &EntityId {
        &self.id
    }

    fn default_order() -> Order {
        Order::desc("created_at")
    }
}

impl HasBlobs for GalleryItem {
    fn blob_urls(&self) -> Vec<&str> {
        vec![self.image.as_str()]
    }
}

impl Categorized for GalleryItem {
    fn category(&self) -> &str {
        &self.category
    }
}
