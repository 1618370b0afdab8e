// ── Optimistic updates ──
//
// Patch the local snapshot first, then push the change to the service with
// retries. If every attempt fails the policy decides whether the local
// patch is rolled back or kept.

use std::sync::Arc;

use kampus_api::CollectionGateway;
use tracing::{debug, warn};

use super::entity_store::{EntityStore, to_row};
use crate::config::OnExhausted;
use crate::error::CoreError;
use crate::model::Entity;

/// How an optimistic update ended.
#[derive(Debug)]
pub enum OptimisticOutcome {
    /// The remote write succeeded.
    Committed { attempts: u32 },
    /// Every attempt failed and the local patch was undone.
    RolledBack { attempts: u32, error: CoreError },
    /// Every attempt failed and the local patch was kept by policy.
    KeptLocal { attempts: u32, error: CoreError },
    /// Every attempt failed, but a fetch replaced the patched entity in the
    /// meantime, so there was nothing left to roll back.
    Superseded { attempts: u32, error: CoreError },
}

impl OptimisticOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Committed { .. } => None,
            Self::RolledBack { error, .. }
            | Self::KeptLocal { error, .. }
            | Self::Superseded { error, .. } => Some(error),
        }
    }
}

impl<E: Entity, G: CollectionGateway> EntityStore<E, G> {
    /// Apply `patch_local` to the entity `key` in the local snapshot and
    /// write the patch it returns to the service, without re-fetching.
    ///
    /// Transient failures are retried with exponential backoff per the
    /// store's retry policy. Returns `Err` only when `key` is not in the
    /// snapshot or the patch cannot be serialized; remote failures are
    /// reported through the outcome.
    ///
    /// Dropping the future mid-retry leaves the local patch in place.
    pub async fn optimistic_update<F>(
        &self,
        key: &E::Key,
        patch_local: F,
    ) -> Result<OptimisticOutcome, CoreError>
    where
        F: FnOnce(&mut E) -> E::Patch,
    {
        let (original, patch, patched_revision) = self.apply_local(key, patch_local)?;
        let row = to_row(&patch)?;
        let policy = self.retry;

        let mut attempt = 0;
        let error = loop {
            attempt += 1;
            match self.write(key, row.clone()).await {
                Ok(()) => {
                    debug!(kind = %E::KIND, %key, attempt, "optimistic write committed");
                    return Ok(OptimisticOutcome::Committed { attempts: attempt });
                }
                Err(e) if e.is_transient() && attempt < policy.attempts() => {
                    let delay = policy.backoff(attempt);
                    debug!(
                        kind = %E::KIND,
                        %key,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "optimistic write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => break e,
            }
        };

        let outcome = match policy.on_exhausted {
            OnExhausted::KeepLocal => OptimisticOutcome::KeptLocal {
                attempts: attempt,
                error,
            },
            OnExhausted::Rollback => {
                if self.roll_back(key, original, patched_revision) {
                    OptimisticOutcome::RolledBack {
                        attempts: attempt,
                        error,
                    }
                } else {
                    OptimisticOutcome::Superseded {
                        attempts: attempt,
                        error,
                    }
                }
            }
        };
        warn!(kind = %E::KIND, %key, ?outcome, "optimistic write exhausted");
        Ok(outcome)
    }

    /// Replace the entity in place. Returns the pre-patch entity, the remote
    /// patch, and the revision right after the local change.
    fn apply_local<F>(
        &self,
        key: &E::Key,
        patch_local: F,
    ) -> Result<(Arc<E>, E::Patch, u64), CoreError>
    where
        F: FnOnce(&mut E) -> E::Patch,
    {
        let mut result = None;
        self.state().send_if_modified(|s| {
            let Some(idx) = s.items.iter().position(|e| e.key() == key) else {
                return false;
            };
            let original = Arc::clone(&s.items[idx]);
            let mut entity = (*original).clone();
            let patch = patch_local(&mut entity);

            let mut items = (*s.items).clone();
            items[idx] = Arc::new(entity);
            s.items = Arc::new(items);
            s.revision += 1;
            result = Some((original, patch, s.revision));
            true
        });

        result.ok_or_else(|| CoreError::NotFound {
            entity_type: E::KIND.to_string(),
            identifier: key.to_string(),
        })
    }

    /// Restore `original` if nothing touched the snapshot since the patch.
    fn roll_back(&self, key: &E::Key, original: Arc<E>, patched_revision: u64) -> bool {
        self.state().send_if_modified(|s| {
            if s.revision != patched_revision {
                return false;
            }
            let Some(idx) = s.items.iter().position(|e| e.key() == key) else {
                return false;
            };
            let mut items = (*s.items).clone();
            items[idx] = original;
            s.items = Arc::new(items);
            s.revision += 1;
            true
        })
    }
}
