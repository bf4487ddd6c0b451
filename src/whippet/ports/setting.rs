//! Query and command ports for settings.

use super::WhippetRepositoryResult;
use crate::whippet::domain::{ApplicationId, Setting, SettingKey, TenantId};
use async_trait::async_trait;

/// Read side of setting persistence.
#[async_trait]
pub trait SettingQueries: Send + Sync {
    /// Finds the effective setting for a key.
    ///
    /// An application-scoped lookup falls back to the tenant-wide value when
    /// no application-specific value exists. A tenant-wide lookup
    /// (`application_id = None`) never returns application-scoped values.
    async fn find(
        &self,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: &SettingKey,
    ) -> WhippetRepositoryResult<Option<Setting>>;

    /// Returns every setting stored for the tenant, ordered by key.
    async fn list_for_tenant(&self, tenant_id: TenantId) -> WhippetRepositoryResult<Vec<Setting>>;
}

/// Write side of setting persistence.
#[async_trait]
pub trait SettingCommands: Send + Sync {
    /// Inserts the setting or replaces the value stored under the same
    /// tenant, application and key. Returns the persisted setting, which keeps
    /// the original identifier when a value is replaced.
    async fn upsert(&self, setting: &Setting) -> WhippetRepositoryResult<Setting>;

    /// Removes the exact-scope setting. Returns whether a row was removed.
    async fn remove(
        &self,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: &SettingKey,
    ) -> WhippetRepositoryResult<bool>;
}
