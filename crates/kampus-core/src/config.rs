// ── Runtime configuration for the store registry ──
//
// Built by the caller (usually from a `kampus-config` profile). The core
// never reads files or environment variables itself.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::EntityKind;

/// Which completed fetch wins when several overlap on one store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FetchOrdering {
    /// Apply a response only if it was issued after the last applied one.
    /// Late responses from older requests are discarded.
    #[default]
    LatestIssued,
    /// Apply every successful response as it arrives; whichever resolves
    /// last wins, even if it was issued first.
    LastResolved,
}

/// What an optimistic update does when its remote write never succeeds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OnExhausted {
    /// Restore the entity as it was before the local patch.
    #[default]
    Rollback,
    /// Keep the local patch; local and remote stay diverged until the next
    /// fetch.
    KeepLocal,
}

/// Retry schedule for optimistic remote writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub on_exhausted: OnExhausted,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            on_exhausted: OnExhausted::Rollback,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, divergent local value kept on failure.
    pub fn keep_local() -> Self {
        Self {
            max_attempts: 1,
            on_exhausted: OnExhausted::KeepLocal,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based: the delay after the
    /// first failed attempt is `backoff(1)`). Doubles each time, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Configuration for a [`StoreRegistry`](crate::StoreRegistry).
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Collection name overrides; kinds not listed use
    /// [`EntityKind::default_collection`].
    pub collections: HashMap<EntityKind, String>,
    pub fetch_ordering: FetchOrdering,
    /// Retry schedule for view-count increments.
    pub view_retry: RetryPolicy,
}

impl RegistryConfig {
    pub fn collection(&self, kind: EntityKind) -> &str {
        self.collections
            .get(&kind)
            .map_or_else(|| kind.default_collection(), String::as_str)
    }
}
