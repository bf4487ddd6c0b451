//! `PostgreSQL` application repository.

use super::{
    ensure_updated, map_insert_error, models::ApplicationRow, run_blocking, schema::applications,
};
use crate::postgres::PgPool;
use crate::whippet::{
    domain::{Application, ApplicationId, ApplicationKind, TenantId},
    ports::{
        ApplicationCommands, ApplicationQueries, WhippetRepositoryError, WhippetRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::prelude::*;

/// `PostgreSQL`-backed application repository.
#[derive(Debug, Clone)]
pub struct PostgresApplicationRepository {
    pool: PgPool,
}

impl PostgresApplicationRepository {
    /// Creates a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationQueries for PostgresApplicationRepository {
    async fn find_by_id(&self, id: ApplicationId) -> WhippetRepositoryResult<Option<Application>> {
        run_blocking(&self.pool, move |connection| {
            applications::table
                .find(id.into_inner())
                .select(ApplicationRow::as_select())
                .first::<ApplicationRow>(connection)
                .optional()
                .map_err(WhippetRepositoryError::persistence)?
                .map(Application::try_from)
                .transpose()
        })
        .await
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> WhippetRepositoryResult<Vec<Application>> {
        run_blocking(&self.pool, move |connection| {
            applications::table
                .filter(applications::tenant_id.eq(tenant_id.into_inner()))
                .order(applications::name.asc())
                .select(ApplicationRow::as_select())
                .load::<ApplicationRow>(connection)
                .map_err(WhippetRepositoryError::persistence)?
                .into_iter()
                .map(Application::try_from)
                .collect()
        })
        .await
    }

    async fn find_enabled_by_kind(
        &self,
        tenant_id: TenantId,
        kind: ApplicationKind,
    ) -> WhippetRepositoryResult<Option<Application>> {
        run_blocking(&self.pool, move |connection| {
            applications::table
                .filter(applications::tenant_id.eq(tenant_id.into_inner()))
                .filter(applications::kind.eq(kind.as_str()))
                .filter(applications::is_enabled.eq(true))
                .order(applications::created_at.asc())
                .select(ApplicationRow::as_select())
                .first::<ApplicationRow>(connection)
                .optional()
                .map_err(WhippetRepositoryError::persistence)?
                .map(Application::try_from)
                .transpose()
        })
        .await
    }
}

#[async_trait]
impl ApplicationCommands for PostgresApplicationRepository {
    async fn insert(&self, application: &Application) -> WhippetRepositoryResult<()> {
        let row = ApplicationRow::from(application);
        run_blocking(&self.pool, move |connection| {
            let key = row.id.to_string();
            diesel::insert_into(applications::table)
                .values(&row)
                .execute(connection)
                .map_err(map_insert_error("application", key))?;
            Ok(())
        })
        .await
    }

    async fn update(&self, application: &Application) -> WhippetRepositoryResult<()> {
        let row = ApplicationRow::from(application);
        run_blocking(&self.pool, move |connection| {
            let affected = diesel::update(applications::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(WhippetRepositoryError::persistence)?;
            ensure_updated(affected, "application", row.id)
        })
        .await
    }
}
