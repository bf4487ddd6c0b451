//! Query and command ports for tenant applications.

use super::WhippetRepositoryResult;
use crate::whippet::domain::{Application, ApplicationId, ApplicationKind, TenantId};
use async_trait::async_trait;

/// Read side of application persistence.
#[async_trait]
pub trait ApplicationQueries: Send + Sync {
    /// Finds an application by identifier.
    async fn find_by_id(&self, id: ApplicationId) -> WhippetRepositoryResult<Option<Application>>;

    /// Returns every application registered for a tenant, ordered by name.
    async fn list_for_tenant(&self, tenant_id: TenantId)
    -> WhippetRepositoryResult<Vec<Application>>;

    /// Returns the first enabled application of the given kind for a tenant.
    async fn find_enabled_by_kind(
        &self,
        tenant_id: TenantId,
        kind: ApplicationKind,
    ) -> WhippetRepositoryResult<Option<Application>>;
}

/// Write side of application persistence.
#[async_trait]
pub trait ApplicationCommands: Send + Sync {
    /// Stores a new application.
    ///
    /// # Errors
    ///
    /// Returns [`super::WhippetRepositoryError::Duplicate`] when the id is
    /// already taken.
    async fn insert(&self, application: &Application) -> WhippetRepositoryResult<()>;

    /// Persists changes to an existing application.
    ///
    /// # Errors
    ///
    /// Returns [`super::WhippetRepositoryError::NotFound`] when the
    /// application does not exist.
    async fn update(&self, application: &Application) -> WhippetRepositoryResult<()>;
}
