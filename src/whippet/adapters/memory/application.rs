//! In-memory application repository.

use super::lock_error;
use crate::whippet::{
    domain::{Application, ApplicationId, ApplicationKind, TenantId},
    ports::{
        ApplicationCommands, ApplicationQueries, WhippetRepositoryError, WhippetRepositoryResult,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory application repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApplicationRepository {
    applications: Arc<RwLock<HashMap<ApplicationId, Application>>>,
}

impl InMemoryApplicationRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationQueries for InMemoryApplicationRepository {
    async fn find_by_id(&self, id: ApplicationId) -> WhippetRepositoryResult<Option<Application>> {
        let applications = self.applications.read().map_err(lock_error)?;
        Ok(applications.get(&id).cloned())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> WhippetRepositoryResult<Vec<Application>> {
        let applications = self.applications.read().map_err(lock_error)?;
        let mut owned: Vec<Application> = applications
            .values()
            .filter(|application| application.tenant_id() == tenant_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(owned)
    }

    async fn find_enabled_by_kind(
        &self,
        tenant_id: TenantId,
        kind: ApplicationKind,
    ) -> WhippetRepositoryResult<Option<Application>> {
        let applications = self.applications.read().map_err(lock_error)?;
        Ok(applications
            .values()
            .filter(|application| {
                application.tenant_id() == tenant_id
                    && application.kind() == kind
                    && application.is_enabled()
            })
            .min_by_key(|application| application.created_at())
            .cloned())
    }
}

#[async_trait]
impl ApplicationCommands for InMemoryApplicationRepository {
    async fn insert(&self, application: &Application) -> WhippetRepositoryResult<()> {
        let mut applications = self.applications.write().map_err(lock_error)?;
        if applications.contains_key(&application.id()) {
            return Err(WhippetRepositoryError::duplicate(
                "application",
                application.id(),
            ));
        }
        applications.insert(application.id(), application.clone());
        Ok(())
    }

    async fn update(&self, application: &Application) -> WhippetRepositoryResult<()> {
        let mut applications = self.applications.write().map_err(lock_error)?;
        let Some(slot) = applications.get_mut(&application.id()) else {
            return Err(WhippetRepositoryError::not_found(
                "application",
                application.id(),
            ));
        };
        *slot = application.clone();
        Ok(())
    }
}
