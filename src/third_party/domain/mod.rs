//! Domain model for third-party entity mapping and reconciliation.

mod entity_map;
mod reconcile;

pub use entity_map::{
    Authority, EntityFingerprint, EntityMapScope, PersistedEntityMapData, ThirdPartyEntityMap,
    ThirdPartySystem,
};
pub use reconcile::{ReconcilePolicy, SkipReason, SyncDecision, reconcile};
