//! Query and command ports for tenants.

use super::WhippetRepositoryResult;
use crate::whippet::domain::{Tenant, TenantCode, TenantId};
use async_trait::async_trait;

/// Read side of tenant persistence.
#[async_trait]
pub trait TenantQueries: Send + Sync {
    /// Finds a tenant by identifier.
    async fn find_by_id(&self, id: TenantId) -> WhippetRepositoryResult<Option<Tenant>>;

    /// Finds a tenant by unique code.
    async fn find_by_code(&self, code: &TenantCode) -> WhippetRepositoryResult<Option<Tenant>>;

    /// Returns active tenants ordered by code.
    async fn list_active(&self) -> WhippetRepositoryResult<Vec<Tenant>>;
}

/// Write side of tenant persistence.
#[async_trait]
pub trait TenantCommands: Send + Sync {
    /// Stores a new tenant.
    ///
    /// # Errors
    ///
    /// Returns [`super::WhippetRepositoryError::Duplicate`] when the id or
    /// code is already taken.
    async fn insert(&self, tenant: &Tenant) -> WhippetRepositoryResult<()>;

    /// Persists changes to an existing tenant.
    ///
    /// # Errors
    ///
    /// Returns [`super::WhippetRepositoryError::NotFound`] when the tenant
    /// does not exist.
    async fn update(&self, tenant: &Tenant) -> WhippetRepositoryResult<()>;
}
