//! In-memory setting repository.

use super::lock_error;
use crate::whippet::{
    domain::{ApplicationId, Setting, SettingKey, TenantId},
    ports::{SettingCommands, SettingQueries, WhippetRepositoryResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

type SettingScope = (TenantId, Option<ApplicationId>, SettingKey);

/// Thread-safe in-memory setting repository keyed by exact scope.
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingRepository {
    settings: Arc<RwLock<BTreeMap<SettingScope, Setting>>>,
}

impl InMemorySettingRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingQueries for InMemorySettingRepository {
    async fn find(
        &self,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: &SettingKey,
    ) -> WhippetRepositoryResult<Option<Setting>> {
        let settings = self.settings.read().map_err(lock_error)?;
        let scoped = application_id
            .and_then(|app| settings.get(&(tenant_id, Some(app), key.clone())));
        Ok(scoped
            .or_else(|| settings.get(&(tenant_id, None, key.clone())))
            .cloned())
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> WhippetRepositoryResult<Vec<Setting>> {
        let settings = self.settings.read().map_err(lock_error)?;
        let mut owned: Vec<Setting> = settings
            .values()
            .filter(|setting| setting.tenant_id() == tenant_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| left.key().cmp(right.key()));
        Ok(owned)
    }
}

#[async_trait]
impl SettingCommands for InMemorySettingRepository {
    async fn upsert(&self, setting: &Setting) -> WhippetRepositoryResult<Setting> {
        let mut settings = self.settings.write().map_err(lock_error)?;
        let scope = (
            setting.tenant_id(),
            setting.application_id(),
            setting.key().clone(),
        );
        let persisted = settings
            .get(&scope)
            .map_or_else(|| setting.clone(), |existing| existing.replaced_by(setting));
        settings.insert(scope, persisted.clone());
        Ok(persisted)
    }

    async fn remove(
        &self,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: &SettingKey,
    ) -> WhippetRepositoryResult<bool> {
        let mut settings = self.settings.write().map_err(lock_error)?;
        Ok(settings
            .remove(&(tenant_id, application_id, key.clone()))
            .is_some())
    }
}
