//! `PostgreSQL` tenant repository.

use super::{
    ensure_updated, map_insert_error, models::TenantRow, run_blocking, schema::tenants,
};
use crate::postgres::PgPool;
use crate::whippet::{
    domain::{Tenant, TenantCode, TenantId},
    ports::{TenantCommands, TenantQueries, WhippetRepositoryError, WhippetRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// `PostgreSQL`-backed tenant repository.
#[derive(Debug, Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantQueries for PostgresTenantRepository {
    async fn find_by_id(&self, id: TenantId) -> WhippetRepositoryResult<Option<Tenant>> {
        run_blocking(&self.pool, move |connection| {
            tenants::table
                .find(id.into_inner())
                .select(TenantRow::as_select())
                .first::<TenantRow>(connection)
                .optional()
                .map_err(WhippetRepositoryError::persistence)?
                .map(Tenant::try_from)
                .transpose()
        })
        .await
    }

    async fn find_by_code(&self, code: &TenantCode) -> WhippetRepositoryResult<Option<Tenant>> {
        let lookup = code.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            tenants::table
                .filter(tenants::code.eq(lookup))
                .select(TenantRow::as_select())
                .first::<TenantRow>(connection)
                .optional()
                .map_err(WhippetRepositoryError::persistence)?
                .map(Tenant::try_from)
                .transpose()
        })
        .await
    }

    async fn list_active(&self) -> WhippetRepositoryResult<Vec<Tenant>> {
        run_blocking(&self.pool, move |connection| {
            tenants::table
                .filter(tenants::is_active.eq(true))
                .order(tenants::code.asc())
                .select(TenantRow::as_select())
                .load::<TenantRow>(connection)
                .map_err(WhippetRepositoryError::persistence)?
                .into_iter()
                .map(Tenant::try_from)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl TenantCommands for PostgresTenantRepository {
    async fn insert(&self, tenant: &Tenant) -> WhippetRepositoryResult<()> {
        let row = TenantRow::from(tenant);
        run_blocking(&self.pool, move |connection| {
            let key = row.code.clone();
            diesel::insert_into(tenants::table)
                .values(&row)
                .execute(connection)
                .map_err(map_insert_error("tenant", key))?;
            Ok(())
        })
        .await
    }

    async fn update(&self, tenant: &Tenant) -> WhippetRepositoryResult<()> {
        let row = TenantRow::from(tenant);
        run_blocking(&self.pool, move |connection| {
            let affected = diesel::update(tenants::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(map_insert_error("tenant", row.code.clone()))?;
            ensure_updated(affected, "tenant", row.id)
        })
        .await
    }
}
