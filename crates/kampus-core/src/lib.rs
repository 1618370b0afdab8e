// kampus-core: entity stores between kampus-api and consumers (CLI, views).
//
// Every entity kind gets one `EntityStore`: a cache of a remote collection
// that is re-read in full after each write. `StoreRegistry` builds the
// nine stores once and hands out `StoreContext` accessors.

pub mod blob;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod scope;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use blob::{CleanupOutcome, delete_with_blobs, purge_blobs};
pub use config::{FetchOrdering, OnExhausted, RegistryConfig, RetryPolicy};
pub use error::CoreError;
pub use registry::{Registered, StoreContext, StoreRegistry, StoreSet};
pub use scope::ViewScope;
pub use store::{EntityStore, FetchOutcome, OptimisticOutcome, StoreState};
pub use stream::{EntityStream, EntityWatchStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Identity and kinds
    Categorized, Entity, EntityId, EntityKind, HasBlobs, WriteMode,
    // Entities
    AcademicKey, AcademicSection, Achievement, AchievementCategory, AchievementType,
    ContentSection, Document, GalleryItem, Gender, News, Student, Teacher, Video,
    // Drafts and patches
    AcademicSectionDraft, AcademicSectionPatch, AchievementDraft, AchievementPatch,
    ContentSectionDraft, ContentSectionPatch, DocumentDraft, DocumentPatch, GalleryDraft,
    GalleryPatch, NewsDraft, NewsPatch, StudentDraft, StudentPatch, TeacherDraft, TeacherPatch,
    VideoDraft, VideoPatch,
};
