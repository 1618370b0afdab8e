// ── Achievement ──
//
// A competition result or award, earned either by a student or by a member
// of staff.

use chrono::{DateTime, Utc};
use kampus_api::Order;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use super::{Entity, EntityKind, HasBlobs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AchievementCategory {
    Academic,
    NonAcademic,
}

/// Who earned the achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AchievementType {
    Student,
    Teacher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: EntityId,
    /// Name of the winner.
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    /// What was achieved, e.g. "Juara 1 Lomba Debat".
    pub achievement: String,
    /// Competition level, e.g. "Kabupaten", "Nasional".
    pub level: String,
    pub year: i32,
    pub category: AchievementCategory,
    #[serde(rename = "type")]
    pub kind: AchievementType,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub achievement: String,
    pub level: String,
    pub year: i32,
    pub category: AchievementCategory,
    #[serde(rename = "type")]
    pub kind: AchievementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<AchievementCategory>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AchievementType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Entity for Achievement {
    type Key = EntityId;
    type Draft = AchievementDraft;
    type Patch = AchievementPatch;

    const KIND: EntityKind = EntityKind::Achievement;

    fn key(&self) -> &EntityId {
        &self.id
    }

    fn default_order() -> Order {
        Order::desc("year")
    }
}

impl HasBlobs for Achievement {
    fn blob_urls(&self) -> Vec<&str> {
        self.image.as_deref().into_iter().collect()
    }
}
