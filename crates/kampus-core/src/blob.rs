// ── Blob cleanup ──
//
// Rows of some kinds point at uploaded files. The store never deletes
// those; callers pair a row deletion with an explicit blob removal. The
// two are independent: a failed blob removal does not restore the row, so
// orphaned objects in storage are possible.

use kampus_api::{BlobStorage, CollectionGateway};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Entity, HasBlobs};
use crate::store::EntityStore;

/// What happened to a blob after its row was handled.
#[derive(Debug)]
pub enum CleanupOutcome {
    /// All objects were removed.
    Removed { paths: Vec<String> },
    /// Nothing to remove: no URLs, or none belonging to this bucket.
    Skipped,
    /// Removal failed; the objects are still in storage.
    Orphaned { paths: Vec<String>, error: CoreError },
}

/// Remove the stored objects behind `urls`. URLs that do not belong to
/// `storage` are ignored.
pub async fn purge_blobs<S: BlobStorage>(storage: &S, urls: &[&str]) -> CleanupOutcome {
    let paths: Vec<String> = urls
        .iter()
        .filter_map(|url| storage.path_from_url(url))
        .collect();
    if paths.is_empty() {
        return CleanupOutcome::Skipped;
    }

    match storage.remove(&paths).await {
        Ok(()) => {
            debug!(?paths, "blobs removed");
            CleanupOutcome::Removed { paths }
        }
        Err(e) => {
            let error = CoreError::from(e);
            warn!(?paths, %error, "blob removal failed, objects orphaned");
            CleanupOutcome::Orphaned { paths, error }
        }
    }
}

/// Delete the entity `key` and then every blob it references.
///
/// The blob URLs are taken from the store's current snapshot. A failed row
/// deletion returns `Err` and leaves the blobs alone; a failed blob removal
/// is reported as [`CleanupOutcome::Orphaned`] while the row stays deleted.
pub async fn delete_with_blobs<E, G, S>(
    store: &EntityStore<E, G>,
    storage: &S,
    key: &E::Key,
) -> Result<CleanupOutcome, CoreError>
where
    E: Entity + HasBlobs,
    G: CollectionGateway,
    S: BlobStorage,
{
    let urls: Vec<String> = store
        .find_by_id(key)
        .map(|e| e.blob_urls().into_iter().map(str::to_owned).collect())
        .unwrap_or_default();

    store.delete(key).await?;

    let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
    Ok(purge_blobs(storage, &urls).await)
}
