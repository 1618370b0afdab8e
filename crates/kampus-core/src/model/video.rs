// ── Video ──

use chrono::{DateTime, Utc};
use kampus_api::Order;
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: EntityId,
    pub title: String,
    /// YouTube link or hosted file URL.
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDraft {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Video {
    /// YouTube video id, when `url` points at YouTube.
    pub fn youtube_id(&self) -> Option<&str> {
        let url = self.url.as_str();
        let rest = url
            .split_once("youtu.be/")
            .or_else(|| url.split_once("watch?v="))
            .or_else(|| url.split_once("/embed/"))
            .map(|(_, rest)| rest)?;
        let id = rest.split(['?', '&', '#', '/']).next().unwrap_or_default();
        (!id.is_empty()).then_some(id)
    }
}

impl Entity for Video {
    type Key = EntityId;
    type Draft = VideoDraft;
    type Patch = VideoPatch;

    const KIND: EntityKind = EntityKind::Video;

    fn key(&self) -> &EntityId {
        &self.id
    }

    fn default_order() -> Order {
        Order::desc("created_at")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(url: &str) -> Video {
        Video {
            id: EntityId::Serial(1),
            title: "Profil Sekolah".into(),
            url: url.into(),
            description: None,
            thumbnail: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn youtube_id_from_common_shapes() {
        assert_eq!(video("https://youtu.be/abc123?t=4").youtube_id(), Some("abc123"));
        assert_eq!(
            video("https://www.youtube.com/watch?v=abc123&list=x").youtube_id(),
            Some("abc123")
        );
        assert_eq!(video("https://www.youtube.com/embed/abc123").youtube_id(), Some("abc123"));
        assert_eq!(video("https://cdn.example.com/v.mp4").youtube_id(), None);
    }
}
