//! Query and command ports for third-party entity maps.
//!
//! Entity maps live alongside the other Whippet entities, so the ports share
//! [`WhippetRepositoryError`].

use crate::third_party::domain::{EntityMapScope, ThirdPartyEntityMap};
use crate::whippet::ports::WhippetRepositoryResult;
use async_trait::async_trait;

pub use crate::whippet::ports::WhippetRepositoryError;

/// Read side of entity-map persistence.
#[async_trait]
pub trait EntityMapQueries: Send + Sync {
    /// Finds the mapping for an internal key.
    async fn find(
        &self,
        scope: &EntityMapScope,
        internal_key: &str,
    ) -> WhippetRepositoryResult<Option<ThirdPartyEntityMap>>;

    /// Finds the mapping that points at a third-party identifier.
    async fn find_by_external_id(
        &self,
        scope: &EntityMapScope,
        external_id: &str,
    ) -> WhippetRepositoryResult<Option<ThirdPartyEntityMap>>;

    /// Lists every mapping in scope, ordered by internal key.
    async fn list(&self, scope: &EntityMapScope)
    -> WhippetRepositoryResult<Vec<ThirdPartyEntityMap>>;
}

/// Write side of entity-map persistence.
#[async_trait]
pub trait EntityMapCommands: Send + Sync {
    /// Inserts the mapping or replaces the one stored for the same internal
    /// key.
    async fn upsert(&self, map: &ThirdPartyEntityMap) -> WhippetRepositoryResult<()>;

    /// Removes the mapping for an internal key. Returns whether one existed.
    async fn remove(&self, scope: &EntityMapScope, internal_key: &str)
    -> WhippetRepositoryResult<bool>;
}
