//! In-memory entity-map repository.

use crate::third_party::{
    domain::{EntityMapScope, ThirdPartyEntityMap, ThirdPartySystem},
    ports::{EntityMapCommands, EntityMapQueries, WhippetRepositoryError},
};
use crate::whippet::{domain::TenantId, ports::WhippetRepositoryResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

type MapKey = (TenantId, ThirdPartySystem, String, String);

fn map_key(scope: &EntityMapScope, internal_key: &str) -> MapKey {
    (
        scope.tenant_id,
        scope.system,
        scope.entity_type.clone(),
        internal_key.to_owned(),
    )
}

fn lock_error(err: impl ToString) -> WhippetRepositoryError {
    WhippetRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Thread-safe in-memory entity-map repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityMapRepository {
    maps: Arc<RwLock<BTreeMap<MapKey, ThirdPartyEntityMap>>>,
}

impl InMemoryEntityMapRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityMapQueries for InMemoryEntityMapRepository {
    async fn find(
        &self,
        scope: &EntityMapScope,
        internal_key: &str,
    ) -> WhippetRepositoryResult<Option<ThirdPartyEntityMap>> {
        let maps = self.maps.read().map_err(lock_error)?;
        Ok(maps.get(&map_key(scope, internal_key)).cloned())
    }

    async fn find_by_external_id(
        &self,
        scope: &EntityMapScope,
        external_id: &str,
    ) -> WhippetRepositoryResult<Option<ThirdPartyEntityMap>> {
        let maps = self.maps.read().map_err(lock_error)?;
        Ok(maps
            .values()
            .find(|map| map.scope() == *scope && map.external_id() == external_id)
            .cloned())
    }

    async fn list(
        &self,
        scope: &EntityMapScope,
    ) -> WhippetRepositoryResult<Vec<ThirdPartyEntityMap>> {
        let maps = self.maps.read().map_err(lock_error)?;
        Ok(maps
            .values()
            .filter(|map| map.scope() == *scope)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EntityMapCommands for InMemoryEntityMapRepository {
    async fn upsert(&self, map: &ThirdPartyEntityMap) -> WhippetRepositoryResult<()> {
        let mut maps = self.maps.write().map_err(lock_error)?;
        maps.insert(map_key(&map.scope(), map.internal_key()), map.clone());
        Ok(())
    }

    async fn remove(
        &self,
        scope: &EntityMapScope,
        internal_key: &str,
    ) -> WhippetRepositoryResult<bool> {
        let mut maps = self.maps.write().map_err(lock_error)?;
        Ok(maps.remove(&map_key(scope, internal_key)).is_some())
    }
}
