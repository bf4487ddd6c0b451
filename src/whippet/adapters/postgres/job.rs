//! `PostgreSQL` job repository.

use super::{ensure_updated, map_insert_error, models::JobRow, run_blocking, schema::jobs};
use crate::postgres::PgPool;
use crate::whippet::{
    domain::{Job, JobId, JobStatus, TenantId},
    ports::{JobCommands, JobQueries, WhippetRepositoryError, WhippetRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// `PostgreSQL`-backed job repository.
#[derive(Debug, Clone)]
pub struct PostgresJobRepository {
    pool: PgPool,
}

impl PostgresJobRepository {
    /// Creates a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueries for PostgresJobRepository {
    async fn find_by_id(&self, id: JobId) -> WhippetRepositoryResult<Option<Job>> {
        run_blocking(&self.pool, move |connection| {
            jobs::table
                .find(id.into_inner())
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(WhippetRepositoryError::persistence)?
                .map(Job::try_from)
                .transpose()
        })
        .await
    }

    async fn find_by_external_ref(
        &self,
        external_ref: &str,
    ) -> WhippetRepositoryResult<Option<Job>> {
        let lookup = external_ref.to_owned();
        run_blocking(&self.pool, move |connection| {
            jobs::table
                .filter(jobs::external_ref.eq(lookup))
                .order(jobs::created_at.desc())
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(WhippetRepositoryError::persistence)?
                .map(Job::try_from)
                .transpose()
        })
        .await
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        status: Option<JobStatus>,
    ) -> WhippetRepositoryResult<Vec<Job>> {
        run_blocking(&self.pool, move |connection| {
            let mut query = jobs::table
                .filter(jobs::tenant_id.eq(tenant_id.into_inner()))
                .order(jobs::created_at.asc())
                .select(JobRow::as_select())
                .into_boxed();
            if let Some(wanted) = status {
                query = query.filter(jobs::status.eq(wanted.as_str()));
            }
            query
                .load::<JobRow>(connection)
                .map_err(WhippetRepositoryError::persistence)?
                .into_iter()
                .map(Job::try_from)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl JobCommands for PostgresJobRepository {
    async fn insert(&self, job: &Job) -> WhippetRepositoryResult<()> {
        let row = JobRow::from(job);
        run_blocking(&self.pool, move |connection| {
            let key = row.id.to_string();
            diesel::insert_into(jobs::table)
                .values(&row)
                .execute(connection)
                .map_err(map_insert_error("job", key))?;
            Ok(())
        })
        .await
    }

    async fn update(&self, job: &Job) -> WhippetRepositoryResult<()> {
        let row = JobRow::from(job);
        run_blocking(&self.pool, move |connection| {
            let affected = diesel::update(jobs::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(WhippetRepositoryError::persistence)?;
            ensure_updated(affected, "job", row.id)
        })
        .await
    }
}
