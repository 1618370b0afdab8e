// ── Domain model ──
//
// One module per entity kind. Each kind is a plain record owned by a remote
// collection, plus a `Draft` (fields for `add`) and a `Patch` (optional
// fields for `update`). The `Entity` trait binds a kind to its collection,
// key column, default order, and write mode, which is all the generic
// store needs.

pub mod academic;
pub mod achievement;
pub mod content;
pub mod document;
pub mod entity_id;
pub mod gallery;
pub mod news;
pub mod student;
pub mod teacher;
pub mod video;

use std::fmt::{Debug, Display};

use kampus_api::Order;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

// ── Re-exports ──────────────────────────────────────────────────────

pub use academic::{AcademicKey, AcademicSection, AcademicSectionDraft, AcademicSectionPatch};
pub use achievement::{
    Achievement, AchievementCategory, AchievementDraft, AchievementPatch, AchievementType,
};
pub use content::{ContentSection, ContentSectionDraft, ContentSectionPatch};
pub use document::{Document, DocumentDraft, DocumentPatch};
pub use entity_id::EntityId;
pub use gallery::{GalleryDraft, GalleryItem, GalleryPatch};
pub use news::{News, NewsDraft, NewsPatch};
pub use student::{Gender, Student, StudentDraft, StudentPatch};
pub use teacher::{Teacher, TeacherDraft, TeacherPatch};
pub use video::{Video, VideoDraft, VideoPatch};

// ── Entity kinds ────────────────────────────────────────────────────

/// The nine kinds of remote-owned content.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    News,
    Gallery,
    Achievement,
    Document,
    Student,
    Teacher,
    AcademicSection,
    ContentSection,
    Video,
}

impl EntityKind {
    /// Default remote collection name.
    pub fn default_collection(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Gallery => "gallery",
            Self::Achievement => "achievements",
            Self::Document => "documents",
            Self::Student => "students",
            Self::Teacher => "teachers",
            Self::AcademicSection => "academic_sections",
            Self::ContentSection => "content_sections",
            Self::Video => "videos",
        }
    }
}

/// How `update` reaches the remote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Patch the row whose key column equals the given key.
    ById,
    /// Insert-or-merge keyed by the key column; the key is written into the row.
    UpsertByKey,
}

/// Binding between a record type and its remote collection.
pub trait Entity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Identifier used by `find_by_id`, `update`, and `delete`.
    type Key: Clone
        + Debug
        + PartialEq
        + Display
        + Serialize
        + From<String>
        + Send
        + Sync
        + 'static;
    /// Fields accepted by `add` (no id, no service-assigned fields).
    type Draft: Serialize + DeserializeOwned + Send + Sync;
    /// Fields accepted by `update`; `None` fields are not written.
    type Patch: Serialize + DeserializeOwned + Send + Sync;

    const KIND: EntityKind;
    const KEY_COLUMN: &'static str = "id";
    const WRITE_MODE: WriteMode = WriteMode::ById;
    /// Column the store fills with the write time when a write leaves it out.
    const STAMP_COLUMN: Option<&'static str> = None;

    fn key(&self) -> &Self::Key;

    /// Fixed order of a full-collection fetch.
    fn default_order() -> Order;
}

/// Entities whose rows point at uploaded blobs.
pub trait HasBlobs {
    /// Every stored blob URL this entity references.
    fn blob_urls(&self) -> Vec<&str>;
}

/// Entities grouped by a free-text category.
pub trait Categorized {
    fn category(&self) -> &str;
}

/// Deserialize `null` as the type's default (the service returns `null`
/// for unset columns with no database default).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
