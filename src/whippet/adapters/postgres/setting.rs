//! `PostgreSQL` setting repository.

use super::{models::SettingRow, run_blocking, schema::settings};
use crate::postgres::PgPool;
use crate::whippet::{
    domain::{ApplicationId, Setting, SettingKey, TenantId},
    ports::{SettingCommands, SettingQueries, WhippetRepositoryError, WhippetRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use uuid::Uuid;

/// `PostgreSQL`-backed setting repository.
#[derive(Debug, Clone)]
pub struct PostgresSettingRepository {
    pool: PgPool,
}

impl PostgresSettingRepository {
    /// Creates a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn find_exact_scope(
    connection: &mut PgConnection,
    tenant_id: Uuid,
    application_id: Option<Uuid>,
    key: &str,
) -> Result<Option<SettingRow>, DieselError> {
    let scoped = settings::table
        .filter(settings::tenant_id.eq(tenant_id))
        .filter(settings::key.eq(key))
        .select(SettingRow::as_select());
    match application_id {
        Some(app) => scoped
            .filter(settings::application_id.eq(app))
            .first::<SettingRow>(connection)
            .optional(),
        None => scoped
            .filter(settings::application_id.is_null())
            .first::<SettingRow>(connection)
            .optional(),
    }
}

#[async_trait]
impl SettingQueries for PostgresSettingRepository {
    async fn find(
        &self,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: &SettingKey,
    ) -> WhippetRepositoryResult<Option<Setting>> {
        let lookup_key = key.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let tenant = tenant_id.into_inner();
            let scoped = match application_id {
                Some(app) => {
                    find_exact_scope(connection, tenant, Some(app.into_inner()), &lookup_key)
                        .map_err(WhippetRepositoryError::persistence)?
                }
                None => None,
            };
            let row = match scoped {
                Some(row) => Some(row),
                None => find_exact_scope(connection, tenant, None, &lookup_key)
                    .map_err(WhippetRepositoryError::persistence)?,
            };
            row.map(Setting::try_from).transpose()
        })
        .await
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> WhippetRepositoryResult<Vec<Setting>> {
        run_blocking(&self.pool, move |connection| {
            settings::table
                .filter(settings::tenant_id.eq(tenant_id.into_inner()))
                .order(settings::key.asc())
                .select(SettingRow::as_select())
                .load::<SettingRow>(connection)
                .map_err(WhippetRepositoryError::persistence)?
                .into_iter()
                .map(Setting::try_from)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl SettingCommands for PostgresSettingRepository {
    async fn upsert(&self, setting: &Setting) -> WhippetRepositoryResult<Setting> {
        let row = SettingRow::from(setting);
        run_blocking(&self.pool, move |connection| {
            let persisted = connection
                .transaction::<SettingRow, DieselError, _>(|transaction| {
                    let existing =
                        find_exact_scope(transaction, row.tenant_id, row.application_id, &row.key)?;
                    let Some(current) = existing else {
                        diesel::insert_into(settings::table)
                            .values(&row)
                            .execute(transaction)?;
                        return Ok(row);
                    };
                    diesel::update(settings::table.find(current.id))
                        .set((
                            settings::value.eq(&row.value),
                            settings::updated_at.eq(row.updated_at),
                        ))
                        .execute(transaction)?;
                    Ok(SettingRow {
                        value: row.value,
                        updated_at: row.updated_at,
                        ..current
                    })
                })
                .map_err(WhippetRepositoryError::persistence)?;
            Setting::try_from(persisted)
        })
        .await
    }

    async fn remove(
        &self,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: &SettingKey,
    ) -> WhippetRepositoryResult<bool> {
        let lookup_key = key.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let existing = find_exact_scope(
                connection,
                tenant_id.into_inner(),
                application_id.map(ApplicationId::into_inner),
                &lookup_key,
            )
            .map_err(WhippetRepositoryError::persistence)?;
            let Some(row) = existing else {
                return Ok(false);
            };
            let affected = diesel::delete(settings::table.find(row.id))
                .execute(connection)
                .map_err(WhippetRepositoryError::persistence)?;
            Ok(affected > 0)
        })
        .await
    }
}
