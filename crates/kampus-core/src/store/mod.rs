// ── Entity stores ──
//
// `EntityStore<E, G>` is the single generic cache; the kind-specific
// readers and the optimistic-update primitive extend it from sibling
// modules.

mod entity_store;
mod optimistic;
mod readers;
mod state;

pub use entity_store::{EntityStore, FetchOutcome};
pub use optimistic::OptimisticOutcome;
pub use state::StoreState;
