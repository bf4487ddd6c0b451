//! In-memory job repository.

use super::lock_error;
use crate::whippet::{
    domain::{Job, JobId, JobStatus, TenantId},
    ports::{JobCommands, JobQueries, WhippetRepositoryError, WhippetRepositoryResult},
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory job repository.
///
/// Jobs are kept in insertion order so listings with equal creation
/// timestamps stay deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobRepository {
    jobs: Arc<RwLock<Vec<Job>>>,
}

impl InMemoryJobRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueries for InMemoryJobRepository {
    async fn find_by_id(&self, id: JobId) -> WhippetRepositoryResult<Option<Job>> {
        let jobs = self.jobs.read().map_err(lock_error)?;
        Ok(jobs.iter().find(|job| job.id() == id).cloned())
    }

    async fn find_by_external_ref(
        &self,
        external_ref: &str,
    ) -> WhippetRepositoryResult<Option<Job>> {
        let jobs = self.jobs.read().map_err(lock_error)?;
        Ok(jobs
            .iter()
            .find(|job| job.external_ref() == Some(external_ref))
            .cloned())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        status: Option<JobStatus>,
    ) -> WhippetRepositoryResult<Vec<Job>> {
        let jobs = self.jobs.read().map_err(lock_error)?;
        let mut matching: Vec<Job> = jobs
            .iter()
            .filter(|job| job.tenant_id() == tenant_id)
            .filter(|job| status.is_none_or(|wanted| job.status() == wanted))
            .cloned()
            .collect();
        matching.sort_by_key(Job::created_at);
        Ok(matching)
    }
}

#[async_trait]
impl JobCommands for InMemoryJobRepository {
    async fn insert(&self, job: &Job) -> WhippetRepositoryResult<()> {
        let mut jobs = self.jobs.write().map_err(lock_error)?;
        if jobs.iter().any(|existing| existing.id() == job.id()) {
            return Err(WhippetRepositoryError::duplicate("job", job.id()));
        }
        jobs.push(job.clone());
        Ok(())
    }

    async fn update(&self, job: &Job) -> WhippetRepositoryResult<()> {
        let mut jobs = self.jobs.write().map_err(lock_error)?;
        let Some(slot) = jobs.iter_mut().find(|existing| existing.id() == job.id()) else {
            return Err(WhippetRepositoryError::not_found("job", job.id()));
        };
        *slot = job.clone();
        Ok(())
    }
}
