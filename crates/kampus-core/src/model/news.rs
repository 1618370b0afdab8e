// ── News article ──

use chrono::{DateTime, NaiveDate, Utc};
use kampus_api::Order;
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::{Categorized, Entity, EntityKind, HasBlobs, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub id: EntityId,
    pub title: String,
    /// Publication date shown on the article.
    pub date: NaiveDate,
    pub author: String,
    pub category: String,
    /// Cover image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Additional gallery image URLs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: bool,
    /// Detail-page view counter.
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDraft {
    pub title: String,
    pub date: NaiveDate,
    pub author: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl Entity for News {
    type Key = EntityId;
    type Draft = NewsDraft;
    type Patch = NewsPatch;

    const KIND: EntityKind = EntityKind::News;

    fn key(&self) -> &EntityId {
        &self.id
    }

    fn default_order() -> Order {
        Order::desc("created_at")
    }
}

impl HasBlobs for News {
    fn blob_urls(&self) -> Vec<&str> {
        self.image
            .as_deref()
            .into_iter()
            .chain(self.images.iter().map(String::as_str))
            .collect()
    }
}

impl Categorized for News {
    fn category(&self) -> &str {
        &self.category
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn deserializes_row_with_nulls() {
        let row = json!({
            "id": 3,
            "title": "Juara Olimpiade Sains",
            "date": "2024-08-17",
            "author": "Humas",
            "category": "prestasi",
            "image": null,
            "images": null,
            "excerpt": null,
            "content": "<p>Selamat!</p>",
            "published": true,
            "views": null,
            "created_at": "2024-08-17T08:00:00+00:00"
        });

        let news: News = serde_json::from_value(row).unwrap();
        assert_eq!(news.id, EntityId::Serial(3));
        assert!(news.images.is_empty());
        assert_eq!(news.views, 0);
        assert_eq!(news.excerpt, "");
        assert!(news.blob_urls().is_empty());
    }

    #[test]
    fn patch_omits_unset_fields() {
        let patch = NewsPatch {
            published: Some(false),
            ..NewsPatch::default()
        };
        assert_eq!(serde_json::to_value(patch).unwrap(), json!({ "published": false }));
    }

    #[test]
    fn draft_serializes_for_insert() {
        let draft = NewsDraft {
            title: "PPDB 2025".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            author: "Admin".into(),
            category: "pengumuman".into(),
            image: None,
            images: vec![],
            excerpt: "Pendaftaran dibuka".into(),
            content: "<p>...</p>".into(),
            published: true,
        };
        insta::assert_json_snapshot!(draft, @r###"
        {
          "title": "PPDB 2025",
          "date": "2025-01-06",
          "author": "Admin",
          "category": "pengumuman",
          "images": [],
          "excerpt": "Pendaftaran dibuka",
          "content": "<p>...</p>",
          "published": true
        }
        "###);
    }

    #[test]
    fn blob_urls_include_cover_and_gallery() {
        let news: News = serde_json::from_value(json!({
            "id": "n1",
            "title": "t",
            "date": "2024-01-01",
            "author": "a",
            "category": "c",
            "image": "https://x/cover.jpg",
            "images": ["https://x/1.jpg", "https://x/2.jpg"],
            "content": "",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            news.blob_urls(),
            vec!["https://x/cover.jpg", "https://x/1.jpg", "https://x/2.jpg"]
        );
    }
}
