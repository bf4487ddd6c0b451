//! Query and command ports for tracked jobs.

use super::WhippetRepositoryResult;
use crate::whippet::domain::{Job, JobId, JobStatus, TenantId};
use async_trait::async_trait;

/// Read side of job persistence.
#[async_trait]
pub trait JobQueries: Send + Sync {
    /// Finds a job by identifier.
    async fn find_by_id(&self, id: JobId) -> WhippetRepositoryResult<Option<Job>>;

    /// Finds the job carrying the given external reference.
    async fn find_by_external_ref(&self, external_ref: &str)
    -> WhippetRepositoryResult<Option<Job>>;

    /// Returns the tenant's jobs ordered by creation time, optionally
    /// filtered by status.
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        status: Option<JobStatus>,
    ) -> WhippetRepositoryResult<Vec<Job>>;
}

/// Write side of job persistence.
#[async_trait]
pub trait JobCommands: Send + Sync {
    /// Stores a new job.
    ///
    /// # Errors
    ///
    /// Returns [`super::WhippetRepositoryError::Duplicate`] when the id is
    /// already taken.
    async fn insert(&self, job: &Job) -> WhippetRepositoryResult<()>;

    /// Persists lifecycle changes to an existing job.
    ///
    /// # Errors
    ///
    /// Returns [`super::WhippetRepositoryError::NotFound`] when the job does
    /// not exist.
    async fn update(&self, job: &Job) -> WhippetRepositoryResult<()>;
}
