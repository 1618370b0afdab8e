//! Per-kind CLI presentation: table rows, detail views, list narrowing.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use tabled::Tabled;

use kampus_api::{BlobStorage, CollectionGateway};
use kampus_core::stream::{AchievementFilter, DocumentFilter, NewsFilter, StudentFilter};
use kampus_core::{
    AcademicSection, Achievement, CleanupOutcome, ContentSection, CoreError, Document, EntityStore,
    GalleryItem, News, Registered, Student, Teacher, Video, delete_with_blobs,
};

use crate::cli::ListArgs;
use crate::error::CliError;
use crate::output::{or_dash, truncate};

/// What the generic entity handler needs to know about a kind.
pub trait CliEntity: Registered {
    type Row: Tabled;

    /// Singular noun for messages ("news article").
    const NOUN: &'static str;
    /// Top-level subcommand that lists this kind ("news").
    const COMMAND: &'static str;
    /// Whether `narrow` honours `--type`.
    const TYPE_FILTER: bool = false;

    fn row(&self) -> Self::Row;

    fn detail(&self) -> Vec<(&'static str, String)>;

    /// Narrow the cached listing by `--category` / `--search`.
    fn narrow<G: CollectionGateway>(
        store: &EntityStore<Self, G>,
        list: &ListArgs,
    ) -> Result<Vec<Arc<Self>>, CliError> {
        if list.category.is_some() {
            return Err(unsupported("category", Self::COMMAND));
        }
        Ok(search(store.items().as_ref().clone(), list.search.as_ref()))
    }

    /// Text matched by `--search`.
    fn search_text(&self) -> String;

    /// Delete `key`; kinds that reference uploaded files also remove them.
    fn delete_purging<G: CollectionGateway, S: BlobStorage>(
        store: &EntityStore<Self, G>,
        _storage: &S,
        key: &Self::Key,
    ) -> impl Future<Output = Result<CleanupOutcome, CoreError>> {
        async move { store.delete(key).await.map(|()| CleanupOutcome::Skipped) }
    }
}

fn unsupported(flag: &str, command: &str) -> CliError {
    CliError::Validation {
        field: flag.into(),
        reason: format!("'kampus {command} list' does not support --{flag}"),
    }
}

/// Fail when `--type` is given to a kind that has no type.
pub fn check_type_flag<E: CliEntity>(list: &ListArgs) -> Result<(), CliError> {
    if list.kind.is_some() && !E::TYPE_FILTER {
        return Err(unsupported("type", E::COMMAND));
    }
    Ok(())
}

/// Keep items whose `search_text` contains `search`, ignoring case.
pub fn search<E: CliEntity>(items: Vec<Arc<E>>, search: Option<&String>) -> Vec<Arc<E>> {
    let Some(q) = search.map(|q| q.to_lowercase()) else {
        return items;
    };
    items
        .into_iter()
        .filter(|e| e.search_text().to_lowercase().contains(&q))
        .collect()
}

fn parse_choice<T: FromStr>(field: &str, raw: &str, expected: &str) -> Result<T, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("expected {expected}, got '{raw}'"),
    })
}

fn yes_no(flag: bool) -> String {
    String::from(if flag { "yes" } else { "no" })
}

// ── News ────────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct NewsRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Published")]
    published: String,
    #[tabled(rename = "Views")]
    views: u64,
}

impl CliEntity for News {
    type Row = NewsRow;
    const NOUN: &'static str = "news article";
    const COMMAND: &'static str = "news";

    fn row(&self) -> NewsRow {
        NewsRow {
            id: self.id.to_string(),
            date: self.date.to_string(),
            title: truncate(&self.title, 48),
            category: self.category.clone(),
            published: yes_no(self.published),
            views: self.views,
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Title", self.title.clone()),
            ("Date", self.date.to_string()),
            ("Author", self.author.clone()),
            ("Category", self.category.clone()),
            ("Published", yes_no(self.published)),
            ("Views", self.views.to_string()),
            ("Excerpt", self.excerpt.clone()),
            ("Image", self.image.clone().unwrap_or_default()),
            ("Images", self.images.join(", ")),
            ("Created", self.created_at.to_rfc3339()),
        ]
    }

    fn narrow<G: CollectionGateway>(
        store: &EntityStore<Self, G>,
        list: &ListArgs,
    ) -> Result<Vec<Arc<Self>>, CliError> {
        let filter = list
            .category
            .clone()
            .map_or(NewsFilter::All, NewsFilter::ByCategory);
        let items = store.filtered(|n| filter.matches(n));
        Ok(search(items, list.search.as_ref()))
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.title, self.excerpt)
    }

    async fn delete_purging<G: CollectionGateway, S: BlobStorage>(
        store: &EntityStore<Self, G>,
        storage: &S,
        key: &Self::Key,
    ) -> Result<CleanupOutcome, CoreError> {
        delete_with_blobs(store, storage, key).await
    }
}

// ── Gallery ─────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct GalleryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Image")]
    image: String,
}

impl CliEntity for GalleryItem {
    type Row = GalleryRow;
    const NOUN: &'static str = "gallery item";
    const COMMAND: &'static str = "gallery";

    fn row(&self) -> GalleryRow {
        GalleryRow {
            id: self.id.to_string(),
            title: truncate(&self.title, 40),
            category: self.category.clone(),
            image: truncate(&self.image, 48),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Title", self.title.clone()),
            ("Category", self.category.clone()),
            ("Image", self.image.clone()),
            ("Created", self.created_at.to_rfc3339()),
        ]
    }

    fn narrow<G: CollectionGateway>(
        store: &EntityStore<Self, G>,
        list: &ListArgs,
    ) -> Result<Vec<Arc<Self>>, CliError> {
        let items = match list.category {
            Some(ref c) => store.by_category(c),
            None => store.items().as_ref().clone(),
        };
        Ok(search(items, list.search.as_ref()))
    }

    fn search_text(&self) -> String {
        self.title.clone()
    }

    async fn delete_purging<G: CollectionGateway, S: BlobStorage>(
        store: &EntityStore<Self, G>,
        storage: &S,
        key: &Self::Key,
    ) -> Result<CleanupOutcome, CoreError> {
        delete_with_blobs(store, storage, key).await
    }
}

// ── Achievements ────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct AchievementRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Year")]
    year: i32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Achievement")]
    achievement: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    kind: String,
}

impl CliEntity for Achievement {
    type Row = AchievementRow;
    const NOUN: &'static str = "achievement";
    const COMMAND: &'static str = "achievements";
    const TYPE_FILTER: bool = true;

    fn row(&self) -> AchievementRow {
        AchievementRow {
            id: self.id.to_string(),
            year: self.year,
            name: truncate(&self.name, 28),
            achievement: truncate(&self.achievement, 36),
            level: self.level.clone(),
            category: self.category.to_string(),
            kind: self.kind.to_string(),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Name", self.name.clone()),
            ("Class", self.class.clone().unwrap_or_default()),
            ("Achievement", self.achievement.clone()),
            ("Level", self.level.clone()),
            ("Year", self.year.to_string()),
            ("Category", self.category.to_string()),
            ("Type", self.kind.to_string()),
            ("Image", self.image.clone().unwrap_or_default()),
        ]
    }

    fn narrow<G: CollectionGateway>(
        store: &EntityStore<Self, G>,
        list: &ListArgs,
    ) -> Result<Vec<Arc<Self>>, CliError> {
        let category = list
            .category
            .as_deref()
            .map(|raw| parse_choice("category", raw, "'academic' or 'non-academic'"))
            .transpose()?
            .map_or(AchievementFilter::All, AchievementFilter::ByCategory);
        let kind = list
            .kind
            .as_deref()
            .map(|raw| parse_choice("type", raw, "'student' or 'teacher'"))
            .transpose()?
            .map_or(AchievementFilter::All, AchievementFilter::ByType);
        let items = store.filtered(|a| category.matches(a) && kind.matches(a));
        Ok(search(items, list.search.as_ref()))
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.achievement)
    }

    async fn delete_purging<G: CollectionGateway, S: BlobStorage>(
        store: &EntityStore<Self, G>,
        storage: &S,
        key: &Self::Key,
    ) -> Result<CleanupOutcome, CoreError> {
        delete_with_blobs(store, storage, key).await
    }
}

// ── Documents ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct DocumentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    file_type: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl CliEntity for Document {
    type Row = DocumentRow;
    const NOUN: &'static str = "document";
    const COMMAND: &'static str = "documents";
    const TYPE_FILTER: bool = true;

    fn row(&self) -> DocumentRow {
        DocumentRow {
            id: self.id.to_string(),
            title: truncate(&self.title, 44),
            category: self.category.clone(),
            file_type: or_dash(self.file_type.as_ref()),
            size: or_dash(self.size.as_ref()),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Title", self.title.clone()),
            ("Category", self.category.clone()),
            ("File", self.file_url.clone()),
            ("Type", self.file_type.clone().unwrap_or_default()),
            ("Size", self.size.clone().unwrap_or_default()),
            ("Created", self.created_at.to_rfc3339()),
        ]
    }

    fn narrow<G: CollectionGateway>(
        store: &EntityStore<Self, G>,
        list: &ListArgs,
    ) -> Result<Vec<Arc<Self>>, CliError> {
        let category = list
            .category
            .clone()
            .map_or(DocumentFilter::All, DocumentFilter::ByCategory);
        let file_type = list
            .kind
            .clone()
            .map_or(DocumentFilter::All, DocumentFilter::ByType);
        let items = store.filtered(|d| category.matches(d) && file_type.matches(d));
        Ok(search(items, list.search.as_ref()))
    }

    fn search_text(&self) -> String {
        self.title.clone()
    }

    async fn delete_purging<G: CollectionGateway, S: BlobStorage>(
        store: &EntityStore<Self, G>,
        storage: &S,
        key: &Self::Key,
    ) -> Result<CleanupOutcome, CoreError> {
        delete_with_blobs(store, storage, key).await
    }
}

// ── Students ────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct StudentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NISN")]
    nisn: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "L/P")]
    gender: String,
}

impl CliEntity for Student {
    type Row = StudentRow;
    const NOUN: &'static str = "student";
    const COMMAND: &'static str = "students";

    fn row(&self) -> StudentRow {
        StudentRow {
            id: self.id.to_string(),
            nisn: self.nisn.clone(),
            name: truncate(&self.name, 36),
            class: self.class.clone(),
            gender: self.gender.to_string(),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Name", self.name.clone()),
            ("NISN", self.nisn.clone()),
            ("Class", self.class.clone()),
            ("Gender", self.gender.to_string()),
            ("Birth place", self.birth_place.clone().unwrap_or_default()),
            ("Birth date", self.birth_date.map(|d| d.to_string()).unwrap_or_default()),
            ("Address", self.address.clone().unwrap_or_default()),
            ("Parent", self.parent_name.clone().unwrap_or_default()),
            ("Phone", self.phone.clone().unwrap_or_default()),
        ]
    }

    fn narrow<G: CollectionGateway>(
        store: &EntityStore<Self, G>,
        list: &ListArgs,
    ) -> Result<Vec<Arc<Self>>, CliError> {
        let by_class = list
            .category
            .clone()
            .map_or(StudentFilter::All, StudentFilter::ByClass);
        let search = list
            .search
            .clone()
            .map_or(StudentFilter::All, StudentFilter::Search);
        Ok(store.filtered(|s| by_class.matches(s) && search.matches(s)))
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.nisn)
    }
}

// ── Teachers ────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct TeacherRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "NIP")]
    nip: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Subject")]
    subject: String,
}

impl CliEntity for Teacher {
    type Row = TeacherRow;
    const NOUN: &'static str = "teacher";
    const COMMAND: &'static str = "teachers";

    fn row(&self) -> TeacherRow {
        TeacherRow {
            id: self.id.to_string(),
            name: truncate(&self.name, 36),
            nip: or_dash(self.nip.as_ref()),
            position: self.position.clone(),
            subject: or_dash(self.subject.as_ref()),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Name", self.name.clone()),
            ("NIP", self.nip.clone().unwrap_or_default()),
            ("Position", self.position.clone()),
            ("Subject", self.subject.clone().unwrap_or_default()),
            ("Photo", self.image.clone().unwrap_or_default()),
        ]
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.position,
            self.subject.as_deref().unwrap_or_default()
        )
    }

    async fn delete_purging<G: CollectionGateway, S: BlobStorage>(
        store: &EntityStore<Self, G>,
        storage: &S,
        key: &Self::Key,
    ) -> Result<CleanupOutcome, CoreError> {
        delete_with_blobs(store, storage, key).await
    }
}

// ── Academic sections ───────────────────────────────────────────────

#[derive(Tabled)]
pub struct AcademicRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Section")]
    key: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Content")]
    content: String,
}

impl CliEntity for AcademicSection {
    type Row = AcademicRow;
    const NOUN: &'static str = "academic section";
    const COMMAND: &'static str = "academic";

    fn row(&self) -> AcademicRow {
        AcademicRow {
            id: self.id.to_string(),
            key: self.section_key.to_string(),
            title: truncate(&self.title, 32),
            content: truncate(&self.content, 40),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Section", self.section_key.to_string()),
            ("Title", self.title.clone()),
            ("Content", self.content.clone()),
        ]
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

// ── Content sections ────────────────────────────────────────────────

#[derive(Tabled)]
pub struct SectionRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Content")]
    content: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl CliEntity for ContentSection {
    type Row = SectionRow;
    const NOUN: &'static str = "section";
    const COMMAND: &'static str = "sections";

    fn row(&self) -> SectionRow {
        SectionRow {
            key: self.section_key.clone(),
            title: truncate(&self.title, 32),
            content: truncate(&self.content, 40),
            updated: or_dash(self.updated_at.map(|t| t.format("%Y-%m-%d %H:%M"))),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Key", self.section_key.clone()),
            ("Title", self.title.clone()),
            ("Content", self.content.clone()),
            (
                "Updated",
                self.updated_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ),
        ]
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

// ── Videos ──────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct VideoRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "YouTube")]
    youtube: String,
    #[tabled(rename = "URL")]
    url: String,
}

impl CliEntity for Video {
    type Row = VideoRow;
    const NOUN: &'static str = "video";
    const COMMAND: &'static str = "videos";

    fn row(&self) -> VideoRow {
        VideoRow {
            id: self.id.to_string(),
            title: truncate(&self.title, 40),
            youtube: or_dash(self.youtube_id()),
            url: truncate(&self.url, 48),
        }
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Title", self.title.clone()),
            ("URL", self.url.clone()),
            ("YouTube ID", self.youtube_id().unwrap_or_default().to_owned()),
            ("Description", self.description.clone().unwrap_or_default()),
            ("Thumbnail", self.thumbnail.clone().unwrap_or_default()),
            ("Created", self.created_at.to_rfc3339()),
        ]
    }

    fn search_text(&self) -> String {
        format!(
            "{} {}",
            self.title,
            self.description.as_deref().unwrap_or_default()
        )
    }
}
