//! Skip-versus-delete reconciliation between internal and external records.
//!
//! Records on both sides are keyed by a stable internal key. Each key yields
//! exactly one [`SyncDecision`], and decisions come out in key order.

use super::{Authority, ThirdPartyEntityMap};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Knobs that shape reconciliation of records only present externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Delete externally present records that Whippet manages but no longer
    /// has internally.
    pub delete_orphans: bool,
}

/// Why a key needs no write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The third party is the source of truth for this record.
    ExternallyOwned,
    /// Both sides already agree.
    Unchanged,
    /// The record is an orphan but orphan deletion is disabled.
    OrphanRetained,
    /// The external record was never created by Whippet.
    Unmanaged,
}

/// Outcome of reconciling a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision<I, E> {
    /// The record exists only internally and must be created externally.
    Create {
        /// Internal key.
        key: String,
        /// Internal record to push.
        internal: I,
    },
    /// Both sides hold the record but disagree.
    Update {
        /// Internal key.
        key: String,
        /// Internal record to push.
        internal: I,
        /// External record to overwrite.
        external: E,
    },
    /// The external record is a managed orphan.
    Delete {
        /// Internal key.
        key: String,
        /// External record to remove.
        external: E,
    },
    /// Nothing to write.
    Skip {
        /// Internal key.
        key: String,
        /// Why the key is left untouched.
        reason: SkipReason,
        /// Internal record, when one exists.
        internal: Option<I>,
        /// External record, when one exists.
        external: Option<E>,
    },
}

impl<I, E> SyncDecision<I, E> {
    /// Returns the key the decision applies to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Create { key, .. }
            | Self::Update { key, .. }
            | Self::Delete { key, .. }
            | Self::Skip { key, .. } => key,
        }
    }

    /// Returns the skip reason, if this decision is a skip.
    #[must_use]
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skip { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Pairs internal and external records by key and decides what to write.
///
/// `same` compares the payloads of a record present on both sides.
/// `is_managed` reports whether an unmapped external record was created by
/// Whippet, which makes it eligible for orphan deletion.
pub fn reconcile<I, E>(
    mut internal: BTreeMap<String, I>,
    mut external: BTreeMap<String, E>,
    maps: &[ThirdPartyEntityMap],
    policy: ReconcilePolicy,
    same: impl Fn(&I, &E) -> bool,
    is_managed: impl Fn(&str, &E) -> bool,
) -> Vec<SyncDecision<I, E>> {
    let authorities: HashMap<&str, Authority> = maps
        .iter()
        .map(|map| (map.internal_key(), map.authority()))
        .collect();
    let keys: BTreeSet<String> = internal.keys().chain(external.keys()).cloned().collect();

    keys.into_iter()
        .filter_map(|key| {
            let authority = authorities.get(key.as_str()).copied();
            let local = internal.remove(&key);
            let remote = external.remove(&key);
            decide(key, local, remote, authority, policy, &same, &is_managed)
        })
        .collect()
}

const fn skipped<I, E>(
    key: String,
    reason: SkipReason,
    internal: Option<I>,
    external: Option<E>,
) -> SyncDecision<I, E> {
    SyncDecision::Skip {
        key,
        reason,
        internal,
        external,
    }
}

fn decide<I, E>(
    key: String,
    local: Option<I>,
    remote: Option<E>,
    authority: Option<Authority>,
    policy: ReconcilePolicy,
    same: &impl Fn(&I, &E) -> bool,
    is_managed: &impl Fn(&str, &E) -> bool,
) -> Option<SyncDecision<I, E>> {
    if local.is_none() && remote.is_none() {
        return None;
    }
    if authority == Some(Authority::External) {
        return Some(skipped(key, SkipReason::ExternallyOwned, local, remote));
    }
    let decision = match (local, remote) {
        (Some(internal), None) => SyncDecision::Create { key, internal },
        (Some(internal), Some(external)) if same(&internal, &external) => {
            skipped(key, SkipReason::Unchanged, Some(internal), Some(external))
        }
        (Some(internal), Some(external)) => SyncDecision::Update {
            key,
            internal,
            external,
        },
        (None, Some(external)) => {
            let managed = authority == Some(Authority::Internal) || is_managed(&key, &external);
            match (managed, policy.delete_orphans) {
                (true, true) => SyncDecision::Delete { key, external },
                (true, false) => skipped(key, SkipReason::OrphanRetained, None, Some(external)),
                (false, _) => skipped(key, SkipReason::Unmanaged, None, Some(external)),
            }
        }
        (None, None) => return None,
    };
    Some(decision)
}
