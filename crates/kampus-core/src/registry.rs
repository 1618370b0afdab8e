// ── Store registry (composition root) ──
//
// Constructs every entity store exactly once and hands out `StoreContext`
// handles. Contexts hold weak references: once the registry is shut down
// or dropped, every accessor fails with `CoreError::OutsideRegistry`
// instead of handing back a store nobody is keeping alive.

use std::sync::{Arc, Weak};

use kampus_api::CollectionGateway;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::CoreError;
use crate::model::{
    AcademicSection, Achievement, ContentSection, Document, Entity, GalleryItem, News, Student,
    Teacher, Video,
};
use crate::scope::ViewScope;
use crate::store::EntityStore;

type Store<E, G> = Arc<EntityStore<E, G>>;

// ── Store set ────────────────────────────────────────────────────────

/// One store per entity kind. Fields are private; reach a store through
/// [`StoreContext`] or [`StoreRegistry::store`].
pub struct StoreSet<G: CollectionGateway> {
    news: Store<News, G>,
    gallery: Store<GalleryItem, G>,
    achievements: Store<Achievement, G>,
    documents: Store<Document, G>,
    students: Store<Student, G>,
    teachers: Store<Teacher, G>,
    academic: Store<AcademicSection, G>,
    sections: Store<ContentSection, G>,
    videos: Store<Video, G>,
}

impl<G: CollectionGateway> StoreSet<G> {
    fn new(gateway: &Arc<G>, config: &RegistryConfig) -> Self {
        Self {
            news: Arc::new(build::<News, G>(gateway, config).with_retry(config.view_retry)),
            gallery: Arc::new(build(gateway, config)),
            achievements: Arc::new(build(gateway, config)),
            documents: Arc::new(build(gateway, config)),
            students: Arc::new(build(gateway, config)),
            teachers: Arc::new(build(gateway, config)),
            academic: Arc::new(build(gateway, config)),
            sections: Arc::new(build(gateway, config)),
            videos: Arc::new(build(gateway, config)),
        }
    }

    /// Run `fetch_all` on every store concurrently.
    async fn fetch_all(&self) {
        tokio::join!(
            self.news.fetch_all(),
            self.gallery.fetch_all(),
            self.achievements.fetch_all(),
            self.documents.fetch_all(),
            self.students.fetch_all(),
            self.teachers.fetch_all(),
            self.academic.fetch_all(),
            self.sections.fetch_all(),
            self.videos.fetch_all(),
        );
    }
}

fn build<E: Entity, G: CollectionGateway>(
    gateway: &Arc<G>,
    config: &RegistryConfig,
) -> EntityStore<E, G> {
    EntityStore::new(Arc::clone(gateway), config.collection(E::KIND))
        .with_ordering(config.fetch_ordering)
}

/// Entity kinds that have a store in the registry.
pub trait Registered: Entity {
    fn select<G: CollectionGateway>(set: &StoreSet<G>) -> &Arc<EntityStore<Self, G>>;
}

macro_rules! registered {
    ($($entity:ty => $field:ident),* $(,)?) => {
        $(
            impl Registered for $entity {
                fn select<G: CollectionGateway>(set: &StoreSet<G>) -> &Arc<EntityStore<Self, G>> {
                    &set.$field
                }
            }
        )*
    };
}

registered! {
    News => news,
    GalleryItem => gallery,
    Achievement => achievements,
    Document => documents,
    Student => students,
    Teacher => teachers,
    AcademicSection => academic,
    ContentSection => sections,
    Video => videos,
}

// ── Registry ─────────────────────────────────────────────────────────

struct RegistryInner<G: CollectionGateway> {
    stores: StoreSet<G>,
    gateway: Arc<G>,
    config: RegistryConfig,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

/// The composition root: owns every store for the life of the application.
pub struct StoreRegistry<G: CollectionGateway> {
    inner: Arc<RegistryInner<G>>,
}

impl<G: CollectionGateway> StoreRegistry<G> {
    /// Construct all stores. Does NOT fetch; every store reports `loading`
    /// until its first fetch settles. Call [`mount`](Self::mount) to start
    /// the initial fetches.
    pub fn new(gateway: Arc<G>, config: RegistryConfig) -> Self {
        let stores = StoreSet::new(&gateway, &config);
        Self {
            inner: Arc::new(RegistryInner {
                stores,
                gateway,
                config,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Construct all stores and spawn each one's initial fetch on the
    /// current tokio runtime.
    pub async fn mount(gateway: Arc<G>, config: RegistryConfig) -> Self {
        let registry = Self::new(gateway, config);
        registry.spawn_initial_fetches().await;
        info!("store registry mounted");
        registry
    }

    async fn spawn_initial_fetches(&self) {
        let stores = &self.inner.stores;
        let mut handles = self.inner.task_handles.lock().await;
        handles.push(self.spawn_fetch(&stores.news));
        handles.push(self.spawn_fetch(&stores.gallery));
        handles.push(self.spawn_fetch(&stores.achievements));
        handles.push(self.spawn_fetch(&stores.documents));
        handles.push(self.spawn_fetch(&stores.students));
        handles.push(self.spawn_fetch(&stores.teachers));
        handles.push(self.spawn_fetch(&stores.academic));
        handles.push(self.spawn_fetch(&stores.sections));
        handles.push(self.spawn_fetch(&stores.videos));
    }

    fn spawn_fetch<E: Entity>(&self, store: &Store<E, G>) -> JoinHandle<()> {
        let store = Arc::clone(store);
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => debug!(kind = %E::KIND, "initial fetch cancelled"),
                () = store.fetch_all() => {}
            }
        })
    }

    /// Re-fetch every store concurrently.
    pub async fn refresh_all(&self) {
        self.inner.stores.fetch_all().await;
    }

    /// Wait until every store has settled its outstanding fetches.
    ///
    /// Stores start out loading until their first fetch, so on a registry
    /// built with [`new`](Self::new) this only resolves once each store has
    /// been fetched (by [`refresh_all`](Self::refresh_all) or directly). Use
    /// [`mount`](Self::mount) to start those fetches up front.
    pub async fn ready(&self) {
        let s = &self.inner.stores;
        tokio::join!(
            s.news.ready(),
            s.gallery.ready(),
            s.achievements.ready(),
            s.documents.ready(),
            s.students.ready(),
            s.teachers.ready(),
            s.academic.ready(),
            s.sections.ready(),
            s.videos.ready(),
        );
    }

    pub fn store<E: Registered>(&self) -> Arc<EntityStore<E, G>> {
        Arc::clone(E::select(&self.inner.stores))
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.inner.gateway
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Handle for consumers. Valid until the registry shuts down.
    pub fn context(&self) -> StoreContext<G> {
        StoreContext {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Cancel every view scope and pending initial fetch, then wait for the
    /// spawned tasks to finish. Contexts fail from here on.
    pub async fn shutdown(self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        info!("store registry shut down");
    }
}

impl<G: CollectionGateway> Drop for StoreRegistry<G> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

// ── Context ──────────────────────────────────────────────────────────

/// Consumer-side handle to the registry's stores.
///
/// Cheap to clone. Every accessor checks that the registry is still alive.
pub struct StoreContext<G: CollectionGateway> {
    inner: Weak<RegistryInner<G>>,
}

impl<G: CollectionGateway> Clone for StoreContext<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<G: CollectionGateway> StoreContext<G> {
    fn live(&self, store: &'static str) -> Result<Arc<RegistryInner<G>>, CoreError> {
        self.inner
            .upgrade()
            .filter(|inner| !inner.cancel.is_cancelled())
            .ok_or(CoreError::OutsideRegistry { store })
    }

    /// Whether accessors will currently succeed.
    pub fn is_live(&self) -> bool {
        self.live("registry").is_ok()
    }

    pub fn store<E: Registered>(&self) -> Result<Arc<EntityStore<E, G>>, CoreError> {
        let inner = self.live(E::KIND.into())?;
        Ok(Arc::clone(E::select(&inner.stores)))
    }

    pub fn news(&self) -> Result<Store<News, G>, CoreError> {
        self.store()
    }

    pub fn gallery(&self) -> Result<Store<GalleryItem, G>, CoreError> {
        self.store()
    }

    pub fn achievements(&self) -> Result<Store<Achievement, G>, CoreError> {
        self.store()
    }

    pub fn documents(&self) -> Result<Store<Document, G>, CoreError> {
        self.store()
    }

    pub fn students(&self) -> Result<Store<Student, G>, CoreError> {
        self.store()
    }

    pub fn teachers(&self) -> Result<Store<Teacher, G>, CoreError> {
        self.store()
    }

    pub fn academic_sections(&self) -> Result<Store<AcademicSection, G>, CoreError> {
        self.store()
    }

    pub fn content_sections(&self) -> Result<Store<ContentSection, G>, CoreError> {
        self.store()
    }

    pub fn videos(&self) -> Result<Store<Video, G>, CoreError> {
        self.store()
    }

    /// A cancellation scope for one consuming view, cancelled when the
    /// registry shuts down.
    pub fn scope(&self, name: impl Into<String>) -> Result<ViewScope, CoreError> {
        let inner = self.live("registry")?;
        Ok(ViewScope::new(name, &inner.cancel))
    }
}
