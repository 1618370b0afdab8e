// ── Filter predicates for store snapshots ──
//
// Used by the CLI to narrow a listing without another round trip.

use crate::model::{Achievement, AchievementCategory, AchievementType, Document, News, Student};

/// Filter predicate for news.
pub enum NewsFilter {
    All,
    ByCategory(String),
}

impl NewsFilter {
    pub fn matches(&self, news: &News) -> bool {
        match self {
            Self::All => true,
            Self::ByCategory(c) => news.category == *c,
        }
    }
}

/// Filter predicate for achievements.
pub enum AchievementFilter {
    All,
    ByCategory(AchievementCategory),
    ByType(AchievementType),
}

impl AchievementFilter {
    pub fn matches(&self, achievement: &Achievement) -> bool {
        match self {
            Self::All => true,
            Self::ByCategory(c) => achievement.category == *c,
            Self::ByType(t) => achievement.kind == *t,
        }
    }
}

/// Filter predicate for documents.
pub enum DocumentFilter {
    All,
    ByCategory(String),
    ByType(String),
}

impl DocumentFilter {
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::ByCategory(c) => document.category == *c,
            Self::ByType(t) => document
                .file_type
                .as_deref()
                .is_some_and(|ft| ft.eq_ignore_ascii_case(t)),
        }
    }
}

/// Filter predicate for the student roster.
pub enum StudentFilter {
    All,
    ByClass(String),
    /// Case-insensitive substring match on name or NISN.
    Search(String),
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        match self {
            Self::All => true,
            Self::ByClass(c) => student.class == *c,
            Self::Search(q) => {
                let q = q.to_lowercase();
                student.name.to_lowercase().contains(&q) || student.nisn.contains(&q)
            }
        }
    }
}
