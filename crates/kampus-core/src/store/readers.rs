// ── Kind-specific readers and writes ──

use std::collections::BTreeSet;
use std::sync::Arc;

use kampus_api::CollectionGateway;
use tracing::warn;

use super::entity_store::EntityStore;
use super::optimistic::OptimisticOutcome;
use crate::error::CoreError;
use crate::model::{
    AcademicKey, AcademicSection, Achievement, AchievementCategory, AchievementType, Categorized,
    ContentSection, ContentSectionPatch, Entity, EntityId, News, NewsPatch,
};

// ── Categorized kinds ────────────────────────────────────────────────

impl<E: Entity + Categorized, G: CollectionGateway> EntityStore<E, G> {
    pub fn by_category(&self, category: &str) -> Vec<Arc<E>> {
        self.filtered(|e| e.category() == category)
    }

    /// Distinct categories in the current snapshot, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.items()
            .iter()
            .map(|e| e.category().to_owned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

// ── News ─────────────────────────────────────────────────────────────

impl<G: CollectionGateway> EntityStore<News, G> {
    pub fn published(&self) -> Vec<Arc<News>> {
        self.filtered(|n| n.published)
    }

    /// Bump the view counter of `id` locally and write it through.
    ///
    /// Never fails the caller: an unknown id or a remote failure is logged.
    /// What happens to the local count after a failed write depends on the
    /// store's retry policy. Returns `None` when `id` is not in the
    /// snapshot.
    pub async fn increment_view_count(&self, id: &EntityId) -> Option<OptimisticOutcome> {
        let result = self
            .optimistic_update(id, |news| {
                news.views += 1;
                NewsPatch {
                    views: Some(news.views),
                    ..NewsPatch::default()
                }
            })
            .await;

        match result {
            Ok(outcome) => {
                if let Some(error) = outcome.error() {
                    warn!(%id, %error, "view count write failed");
                }
                Some(outcome)
            }
            Err(e) => {
                warn!(%id, error = %e, "view count not incremented");
                None
            }
        }
    }
}

// ── Achievements ─────────────────────────────────────────────────────

impl<G: CollectionGateway> EntityStore<Achievement, G> {
    pub fn academic(&self) -> Vec<Arc<Achievement>> {
        self.filtered(|a| a.category == AchievementCategory::Academic)
    }

    pub fn non_academic(&self) -> Vec<Arc<Achievement>> {
        self.filtered(|a| a.category == AchievementCategory::NonAcademic)
    }

    pub fn by_type(&self, kind: AchievementType) -> Vec<Arc<Achievement>> {
        self.filtered(|a| a.kind == kind)
    }
}

// ── Page sections ────────────────────────────────────────────────────

impl<G: CollectionGateway> EntityStore<AcademicSection, G> {
    pub fn section(&self, key: AcademicKey) -> Option<Arc<AcademicSection>> {
        self.filtered(|s| s.section_key == key).into_iter().next()
    }
}

impl<G: CollectionGateway> EntityStore<ContentSection, G> {
    pub fn section(&self, key: &str) -> Option<Arc<ContentSection>> {
        self.find_by_id(&key.to_owned())
    }

    /// Create or overwrite the section `key`, then re-fetch.
    ///
    /// `title` may be omitted when the section already exists; the stored
    /// title is kept. A brand-new key without a title is rejected by the
    /// service as a constraint violation.
    pub async fn upsert_section(
        &self,
        key: &str,
        content: impl Into<String>,
        title: Option<String>,
    ) -> Result<(), CoreError> {
        let patch = ContentSectionPatch::content(content, title);
        self.update(&key.to_owned(), &patch).await
    }
}
