// ── Staff directory entry ──

use chrono::{DateTime, Utc};
use kampus_api::Order;
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Entity, EntityKind, HasBlobs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: EntityId,
    pub name: String,
    /// Civil-service employee number; absent for contract staff.
    #[serde(default)]
    pub nip: Option<String>,
    pub position: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nip: Option<String>,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Entity for Teacher {
    type Key = EntityId;
    type Draft = TeacherDraft;
    type Patch = TeacherPatch;

    const KIND: EntityKind = EntityKind::Teacher;

    fn key(&self) -> &EntityId {
        &self.id
    }

    fn default_order() -> Order {
        Order::asc("name")
    }
}

impl HasBlobs for Teacher {
    fn blob_urls(&self) -> Vec<&str> {
        self.image.as_deref().into_iter().collect()
    }
}
