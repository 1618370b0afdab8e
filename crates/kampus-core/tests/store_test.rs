#![allow(clippy::unwrap_used)]
// Behavioural tests for `EntityStore` against in-process gateways.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use kampus_api::{BlobStorage, MemoryGateway, MemoryStorage};
use kampus_core::{
    Achievement, AchievementType, CleanupOutcome, ContentSection, ContentSectionPatch, CoreError,
    EntityId, EntityStore, FetchOrdering, FetchOutcome, GalleryDraft, GalleryItem, GalleryPatch,
    Gender, News, OnExhausted, OptimisticOutcome, RetryPolicy, Student, StudentDraft,
    StudentPatch, delete_with_blobs,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{Failure, ScriptedGateway, news_row, student_row};

fn gallery_draft(title: &str) -> GalleryDraft {
    GalleryDraft {
        title: title.into(),
        category: "fasilitas".into(),
        image: format!("memory://media/gallery/{title}.jpg"),
    }
}

fn titles(store: &EntityStore<News, ScriptedGateway>) -> Vec<String> {
    store.items().iter().map(|n| n.title.clone()).collect()
}

// ── Refetch after write ─────────────────────────────────────────────

#[tokio::test]
async fn add_resynchronizes_with_generated_id() {
    let gw = Arc::new(MemoryGateway::new());
    let store: EntityStore<GalleryItem, _> = EntityStore::new(Arc::clone(&gw), "gallery");
    store.fetch_all().await;
    assert!(store.items().is_empty());

    store.add(&gallery_draft("Lab Komputer")).await.unwrap();

    let items = store.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Lab Komputer");
    assert!(items[0].id.as_uuid().is_some(), "id assigned by the service");

    let fresh: EntityStore<GalleryItem, _> = EntityStore::new(gw, "gallery");
    fresh.fetch_all().await;
    assert_eq!(*store.items(), *fresh.items());
}

#[tokio::test]
async fn update_writes_patch_and_refetches() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed("students", vec![student_row(1, "Budi"), student_row(2, "Andi")]);
    let store: EntityStore<Student, _> = EntityStore::new(gw, "students");
    store.fetch_all().await;
    let revision = store.revision();

    let patch = StudentPatch {
        class: Some("XI-B".into()),
        ..StudentPatch::default()
    };
    store.update(&EntityId::Serial(1), &patch).await.unwrap();

    let budi = store.find_by_id(&EntityId::Serial(1)).unwrap();
    assert_eq!(budi.class, "XI-B");
    assert!(store.revision() > revision);
    // Default order is by name.
    assert_eq!(store.items()[0].name, "Andi");
}

#[tokio::test]
async fn delete_removes_and_stays_removed() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed("students", vec![student_row(1, "Budi"), student_row(2, "Citra")]);
    let store: EntityStore<Student, _> = EntityStore::new(gw, "students");
    store.fetch_all().await;

    store.delete(&EntityId::Serial(1)).await.unwrap();
    assert!(store.find_by_id(&EntityId::Serial(1)).is_none());

    store.fetch_all().await;
    assert!(store.find_by_id(&EntityId::Serial(1)).is_none());
    assert_eq!(store.items().len(), 1);
}

#[tokio::test]
async fn empty_patch_is_rejected_locally() {
    let gw = Arc::new(MemoryGateway::new());
    let store: EntityStore<GalleryItem, _> = EntityStore::new(gw, "gallery");

    let err = store
        .update(&EntityId::Serial(1), &GalleryPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }), "got {err:?}");
}

// ── Failure policy ──────────────────────────────────────────────────

#[tokio::test]
async fn failed_fetch_keeps_items_and_clears_loading() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed("students", vec![student_row(1, "Budi")]);
    let store: EntityStore<Student, _> = EntityStore::new(Arc::clone(&gw), "students");
    store.fetch_all().await;
    let before = store.items();

    gw.set_offline(true);
    store.fetch_all().await;

    assert!(!store.is_loading());
    assert_eq!(*store.items(), *before);
    assert!(store.refresh().await.is_err());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn failed_writes_propagate_and_leave_items() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed("students", vec![student_row(1, "Budi")]);
    let store: EntityStore<Student, _> = EntityStore::new(Arc::clone(&gw), "students");
    store.fetch_all().await;
    let revision = store.revision();

    gw.set_offline(true);
    let id = EntityId::Serial(1);
    let patch = StudentPatch {
        name: Some("Budi S.".into()),
        ..StudentPatch::default()
    };

    assert!(matches!(
        store.update(&id, &patch).await,
        Err(CoreError::Unavailable { .. })
    ));
    assert!(store.delete(&id).await.is_err());
    assert_eq!(store.revision(), revision);
    assert_eq!(store.items()[0].name, "Budi");
}

#[tokio::test]
async fn failed_add_propagates_and_leaves_items() {
    let memory = MemoryGateway::new();
    memory.seed("students", vec![student_row(1, "Budi")]);
    let gw = Arc::new(ScriptedGateway::new(memory));
    let store: EntityStore<Student, _> = EntityStore::new(Arc::clone(&gw), "students");
    store.fetch_all().await;
    let revision = store.revision();
    let before = store.items();

    gw.fail_next_writes(&[Failure::Rejected]);
    let draft = StudentDraft {
        name: "Citra".into(),
        nisn: "0051234567".into(),
        class: "X-B".into(),
        gender: Gender::Female,
        birth_place: None,
        birth_date: None,
        address: None,
        parent_name: None,
        phone: None,
    };
    let err = store.add(&draft).await.unwrap_err();

    assert!(matches!(err, CoreError::Remote { .. }), "got {err:?}");
    assert_eq!(gw.writes(), 1);
    // No refetch after a rejected write.
    assert_eq!(gw.selects_started(), 1);
    assert_eq!(store.revision(), revision);
    assert_eq!(*store.items(), *before);
    assert_eq!(gw.memory().rows("students").len(), 1);
}

#[tokio::test]
async fn malformed_row_fails_soft() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed("students", vec![common::row(json!({ "id": 1 }))]);
    let store: EntityStore<Student, _> = EntityStore::new(gw, "students");

    let err = store.refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Serialization { .. }), "got {err:?}");
    assert!(store.items().is_empty());
    assert!(!store.is_loading());
}

// ── View counter ────────────────────────────────────────────────────

type NewsStore = EntityStore<News, ScriptedGateway>;

async fn news_store(policy: RetryPolicy) -> (Arc<ScriptedGateway>, NewsStore) {
    let memory = MemoryGateway::new();
    memory.seed("news", vec![news_row(1, "Upacara", 10)]);
    let gw = Arc::new(ScriptedGateway::new(memory));
    let store = EntityStore::new(Arc::clone(&gw), "news").with_retry(policy);
    store.fetch_all().await;
    (gw, store)
}

fn remote_views(gw: &ScriptedGateway) -> serde_json::Value {
    gw.memory().rows("news")[0]["views"].clone()
}

#[tokio::test]
async fn view_increment_keeps_local_bump_when_write_fails() {
    let (gw, store) = news_store(RetryPolicy::keep_local()).await;
    gw.fail_next_writes(&[Failure::Unavailable]);
    let id = EntityId::Serial(1);

    let outcome = store.increment_view_count(&id).await.unwrap();

    assert!(matches!(outcome, OptimisticOutcome::KeptLocal { attempts: 1, .. }));
    assert_eq!(store.find_by_id(&id).unwrap().views, 11);
    assert_eq!(remote_views(&gw), json!(10));
}

#[tokio::test]
async fn view_increment_does_not_refetch() {
    let (gw, store) = news_store(RetryPolicy::default()).await;
    let selects = gw.selects_started();

    let outcome = store.increment_view_count(&EntityId::Serial(1)).await.unwrap();

    assert!(outcome.is_committed());
    assert_eq!(gw.selects_started(), selects);
    assert_eq!(remote_views(&gw), json!(11));
    assert_eq!(store.items()[0].views, 11);
}

#[tokio::test(start_paused = true)]
async fn view_increment_retries_transient_failures() {
    let (gw, store) = news_store(RetryPolicy::default()).await;
    gw.fail_next_writes(&[Failure::Unavailable, Failure::Unavailable]);

    let started = tokio::time::Instant::now();
    let outcome = store.increment_view_count(&EntityId::Serial(1)).await.unwrap();

    assert!(matches!(outcome, OptimisticOutcome::Committed { attempts: 3 }));
    assert_eq!(gw.writes(), 3);
    assert_eq!(remote_views(&gw), json!(11));
    // 200ms then 400ms of backoff.
    assert!(started.elapsed() >= Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn view_increment_rolls_back_after_exhaustion() {
    let (gw, store) = news_store(RetryPolicy::default()).await;
    gw.fail_next_writes(&[Failure::Unavailable; 3]);
    let id = EntityId::Serial(1);

    let outcome = store.increment_view_count(&id).await.unwrap();

    assert!(matches!(outcome, OptimisticOutcome::RolledBack { attempts: 3, .. }));
    assert_eq!(store.find_by_id(&id).unwrap().views, 10);
    assert_eq!(remote_views(&gw), json!(10));
}

#[tokio::test]
async fn view_increment_stops_on_permanent_failure() {
    let policy = RetryPolicy {
        max_attempts: 5,
        on_exhausted: OnExhausted::Rollback,
        ..RetryPolicy::default()
    };
    let (gw, store) = news_store(policy).await;
    gw.fail_next_writes(&[Failure::Rejected]);

    let outcome = store.increment_view_count(&EntityId::Serial(1)).await.unwrap();

    assert!(matches!(outcome, OptimisticOutcome::RolledBack { attempts: 1, .. }));
    assert_eq!(gw.writes(), 1);
}

#[tokio::test]
async fn view_increment_of_unknown_id_is_a_no_op() {
    let (gw, store) = news_store(RetryPolicy::default()).await;
    assert!(store.increment_view_count(&EntityId::Serial(99)).await.is_none());
    assert_eq!(gw.writes(), 0);
}

// ── Upsert by key ───────────────────────────────────────────────────

fn sections() -> (Arc<MemoryGateway>, EntityStore<ContentSection, MemoryGateway>) {
    let gw = Arc::new(MemoryGateway::new().with_required("content_sections", &["title"]));
    let store = EntityStore::new(Arc::clone(&gw), "content_sections");
    (gw, store)
}

#[tokio::test]
async fn upsert_creates_then_updates_same_key() {
    let (gw, store) = sections();

    store
        .upsert_section("fasilitas", "Lab komputer", Some("Fasilitas".into()))
        .await
        .unwrap();
    assert_eq!(gw.rows("content_sections").len(), 1);

    store
        .upsert_section("fasilitas", "Lab komputer dan perpustakaan", None)
        .await
        .unwrap();

    let rows = gw.rows("content_sections");
    assert_eq!(rows.len(), 1);
    let section = store.section("fasilitas").unwrap();
    assert_eq!(section.title, "Fasilitas");
    assert_eq!(section.content, "Lab komputer dan perpustakaan");
    assert!(section.updated_at.is_some());
}

#[tokio::test]
async fn section_writes_stamp_updated_at() {
    let (gw, store) = sections();
    gw.seed(
        "content_sections",
        vec![common::row(json!({
            "section_key": "visi",
            "title": "Visi",
            "content": "Unggul",
            "updated_at": null
        }))],
    );

    let patch = ContentSectionPatch {
        content: Some("Unggul dan berakhlak".into()),
        ..ContentSectionPatch::default()
    };
    store.update(&"visi".to_owned(), &patch).await.unwrap();

    assert!(gw.rows("content_sections")[0]["updated_at"].is_string());
    let section = store.section("visi").unwrap();
    assert_eq!(section.content, "Unggul dan berakhlak");
    assert!(section.updated_at.is_some());

    // An explicit stamp is written as given.
    let stamp: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
    let patch = ContentSectionPatch {
        updated_at: Some(stamp),
        ..ContentSectionPatch::default()
    };
    store.update(&"visi".to_owned(), &patch).await.unwrap();
    assert_eq!(store.section("visi").unwrap().updated_at, Some(stamp));
}

#[tokio::test]
async fn upsert_of_new_key_without_title_is_a_constraint_violation() {
    let (gw, store) = sections();

    let err = store
        .upsert_section("visi", "Unggul dalam prestasi", None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::ConstraintViolation { ref code, .. } if code == "23502"),
        "got {err:?}"
    );
    assert!(gw.rows("content_sections").is_empty());
    assert!(store.items().is_empty());
}

// ── Overlapping fetches ─────────────────────────────────────────────

/// Start fetch A on the original table, change the table, start fetch B,
/// then resolve B before A.
async fn race(ordering: FetchOrdering) -> (Vec<String>, Vec<FetchOutcome>) {
    let memory = MemoryGateway::new();
    memory.seed("news", vec![news_row(1, "Lama", 0)]);
    let gw = Arc::new(ScriptedGateway::new(memory));
    let store = Arc::new(
        EntityStore::<News, _>::new(Arc::clone(&gw), "news").with_ordering(ordering),
    );

    let gate_a = gw.gate_next_select();
    let gate_b = gw.gate_next_select();

    let first = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.refresh().await.unwrap() }
    });
    gw.wait_for_selects(1).await;

    gw.memory().seed("news", vec![news_row(2, "Baru", 0)]);
    let second = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.refresh().await.unwrap() }
    });
    gw.wait_for_selects(2).await;

    gate_b.send(()).unwrap();
    let outcome_b = second.await.unwrap();
    assert!(store.is_loading(), "first fetch still outstanding");

    gate_a.send(()).unwrap();
    let outcome_a = first.await.unwrap();
    assert!(!store.is_loading());

    (titles(&store), vec![outcome_a, outcome_b])
}

#[tokio::test]
async fn last_resolved_lets_the_slow_older_fetch_win() {
    let (titles, outcomes) = race(FetchOrdering::LastResolved).await;
    assert_eq!(titles, vec!["Lama"]);
    assert_eq!(outcomes, vec![FetchOutcome::Applied, FetchOutcome::Applied]);
}

#[tokio::test]
async fn latest_issued_discards_the_stale_response() {
    let (titles, outcomes) = race(FetchOrdering::LatestIssued).await;
    assert_eq!(titles, vec!["Baru"]);
    assert_eq!(outcomes, vec![FetchOutcome::Stale, FetchOutcome::Applied]);
}

#[tokio::test]
async fn aborted_fetch_releases_loading() {
    let memory = MemoryGateway::new();
    memory.seed("news", vec![news_row(1, "Upacara", 0)]);
    let gw = Arc::new(ScriptedGateway::new(memory));
    let store = Arc::new(EntityStore::<News, _>::new(Arc::clone(&gw), "news"));
    let _gate = gw.gate_next_select();

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.fetch_all().await }
    });
    gw.wait_for_selects(1).await;
    assert!(store.is_loading());

    task.abort();
    let _ = task.await;

    assert!(!store.is_loading());
    assert!(store.items().is_empty());
    assert_eq!(store.revision(), 0);
}

// ── Observation ─────────────────────────────────────────────────────

#[tokio::test]
async fn subscribers_see_each_applied_fetch() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed("students", vec![student_row(1, "Budi")]);
    let store: EntityStore<Student, _> = EntityStore::new(Arc::clone(&gw), "students");
    let mut stream = store.subscribe();
    assert!(stream.is_loading());
    assert!(stream.current().is_empty());

    store.fetch_all().await;
    let items = stream.changed().await.unwrap();
    assert_eq!(items.len(), 1);
    assert!(!stream.is_loading());
}

#[tokio::test]
async fn ready_waits_for_the_first_fetch() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed("students", vec![student_row(1, "Budi"), student_row(2, "Ani")]);
    let store = Arc::new(EntityStore::<Student, _>::new(gw, "students"));

    let fetch = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.fetch_all().await }
    });
    let state = store.ready().await;
    fetch.await.unwrap();

    assert!(!state.loading);
    assert_eq!(state.len(), 2);
    assert!(store.last_fetched().is_some());
}

// ── Blob cleanup ────────────────────────────────────────────────────

#[tokio::test]
async fn delete_with_blobs_removes_row_then_object() {
    let gw = Arc::new(MemoryGateway::new());
    let storage = MemoryStorage::new("media");
    let url = storage
        .upload("gallery/lab.jpg", Bytes::from_static(b"jpg"), "image/jpeg")
        .await
        .unwrap();

    let store: EntityStore<GalleryItem, _> = EntityStore::new(gw, "gallery");
    store
        .add(&GalleryDraft {
            title: "Lab".into(),
            category: "fasilitas".into(),
            image: url,
        })
        .await
        .unwrap();
    let id = store.items()[0].id.clone();

    let outcome = delete_with_blobs(&store, &storage, &id).await.unwrap();

    assert!(
        matches!(outcome, CleanupOutcome::Removed { ref paths } if paths == &["gallery/lab.jpg"]),
        "got {outcome:?}"
    );
    assert!(store.items().is_empty());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn foreign_blob_urls_are_skipped() {
    let gw = Arc::new(MemoryGateway::new());
    let storage = MemoryStorage::new("media");
    let store: EntityStore<GalleryItem, _> = EntityStore::new(gw, "gallery");
    store
        .add(&GalleryDraft {
            title: "Logo".into(),
            category: "umum".into(),
            image: "https://cdn.example.com/logo.png".into(),
        })
        .await
        .unwrap();
    let id = store.items()[0].id.clone();

    let outcome = delete_with_blobs(&store, &storage, &id).await.unwrap();
    assert!(matches!(outcome, CleanupOutcome::Skipped));
    assert!(store.items().is_empty());
}

// ── Derived readers ─────────────────────────────────────────────────

#[tokio::test]
async fn derived_readers_filter_the_snapshot() {
    let gw = Arc::new(MemoryGateway::new());
    let mut draft_row = news_row(3, "Rapat Guru", 0);
    draft_row.insert("published".into(), json!(false));
    draft_row.insert("category".into(), json!("pengumuman"));
    gw.seed("news", vec![news_row(1, "Upacara", 0), news_row(2, "Pramuka", 0), draft_row]);
    gw.seed(
        "achievements",
        vec![
            common::row(json!({
                "id": 1, "name": "Rina", "achievement": "Juara 1 OSN",
                "level": "Nasional", "year": 2024, "category": "academic", "type": "student"
            })),
            common::row(json!({
                "id": 2, "name": "Pak Budi", "achievement": "Guru Teladan",
                "level": "Provinsi", "year": 2023, "category": "non-academic", "type": "teacher"
            })),
        ],
    );

    let news: EntityStore<News, _> = EntityStore::new(Arc::clone(&gw), "news");
    news.fetch_all().await;
    assert_eq!(news.published().len(), 2);
    assert_eq!(news.by_category("pengumuman").len(), 1);
    assert_eq!(news.categories(), vec!["kegiatan", "pengumuman"]);

    let achievements: EntityStore<Achievement, _> = EntityStore::new(gw, "achievements");
    achievements.fetch_all().await;
    assert_eq!(achievements.academic().len(), 1);
    assert_eq!(achievements.non_academic()[0].name, "Pak Budi");
    assert_eq!(achievements.by_type(AchievementType::Teacher).len(), 1);
    assert_eq!(achievements.by_type(AchievementType::Student)[0].year, 2024);
}
