//! In-memory tenant repository.

use super::lock_error;
use crate::whippet::{
    domain::{Tenant, TenantCode, TenantId},
    ports::{TenantCommands, TenantQueries, WhippetRepositoryError, WhippetRepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory tenant repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTenantRepository {
    state: Arc<RwLock<InMemoryTenantState>>,
}

#[derive(Debug, Default)]
struct InMemoryTenantState {
    tenants: HashMap<TenantId, Tenant>,
    code_index: HashMap<TenantCode, TenantId>,
}

impl InMemoryTenantRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantQueries for InMemoryTenantRepository {
    async fn find_by_id(&self, id: TenantId) -> WhippetRepositoryResult<Option<Tenant>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tenants.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &TenantCode) -> WhippetRepositoryResult<Option<Tenant>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .code_index
            .get(code)
            .and_then(|id| state.tenants.get(id))
            .cloned())
    }

    async fn list_active(&self) -> WhippetRepositoryResult<Vec<Tenant>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut active: Vec<Tenant> = state
            .tenants
            .values()
            .filter(|tenant| tenant.is_active())
            .cloned()
            .collect();
        active.sort_by(|left, right| left.code().cmp(right.code()));
        Ok(active)
    }
}

#[async_trait]
impl TenantCommands for InMemoryTenantRepository {
    async fn insert(&self, tenant: &Tenant) -> WhippetRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tenants.contains_key(&tenant.id()) {
            return Err(WhippetRepositoryError::duplicate("tenant", tenant.id()));
        }
        if state.code_index.contains_key(tenant.code()) {
            return Err(WhippetRepositoryError::duplicate("tenant code", tenant.code()));
        }
        state.code_index.insert(tenant.code().clone(), tenant.id());
        state.tenants.insert(tenant.id(), tenant.clone());
        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> WhippetRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let previous_code = state
            .tenants
            .get(&tenant.id())
            .map(|existing| existing.code().clone())
            .ok_or_else(|| WhippetRepositoryError::not_found("tenant", tenant.id()))?;

        if previous_code != *tenant.code() {
            if state.code_index.contains_key(tenant.code()) {
                return Err(WhippetRepositoryError::duplicate("tenant code", tenant.code()));
            }
            state.code_index.remove(&previous_code);
            state.code_index.insert(tenant.code().clone(), tenant.id());
        }
        state.tenants.insert(tenant.id(), tenant.clone());
        Ok(())
    }
}
