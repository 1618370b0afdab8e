// ── Academic page sections ──
//
// A fixed set of rich-text sections (curriculum, extracurriculars, ...) each
// stored as one row identified by a surrogate id and tagged with its key.

use kampus_api::Order;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::entity_id::EntityId;
use super::{Entity, EntityKind};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AcademicKey {
    Curriculum,
    Extracurricular,
    Schedule,
    Calendar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicSection {
    pub id: EntityId,
    pub section_key: AcademicKey,
    pub title: String,
    /// Rich-text (HTML) body.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicSectionDraft {
    pub section_key: AcademicKey,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicSectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Entity for AcademicSection {
    type Key = EntityId;
    type Draft = AcademicSectionDraft;
    type Patch = AcademicSectionPatch;

    const KIND: EntityKind = EntityKind::AcademicSection;

    fn key(&self) -> &EntityId {
        &self.id
    }

    fn default_order() -> Order {
        Order::asc("section_key")
    }
}
