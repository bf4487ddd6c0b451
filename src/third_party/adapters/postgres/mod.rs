//! `PostgreSQL` entity-map repository.

mod schema;

use crate::postgres::{PgAccessError, PgPool, run_with_connection};
use crate::third_party::{
    domain::{
        Authority, EntityFingerprint, EntityMapScope, PersistedEntityMapData, ThirdPartyEntityMap,
        ThirdPartySystem,
    },
    ports::{EntityMapCommands, EntityMapQueries, WhippetRepositoryError},
};
use crate::whippet::{domain::TenantId, ports::WhippetRepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use schema::third_party_entity_maps as maps;
use uuid::Uuid;

/// Row model for `third_party_entity_maps`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = maps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct EntityMapRow {
    tenant_id: Uuid,
    system: String,
    entity_type: String,
    internal_key: String,
    external_id: String,
    authority: String,
    fingerprint: String,
    synced_at: DateTime<Utc>,
}

impl From<&ThirdPartyEntityMap> for EntityMapRow {
    fn from(map: &ThirdPartyEntityMap) -> Self {
        Self {
            tenant_id: map.tenant_id().into_inner(),
            system: map.system().as_str().to_owned(),
            entity_type: map.entity_type().to_owned(),
            internal_key: map.internal_key().to_owned(),
            external_id: map.external_id().to_owned(),
            authority: map.authority().as_str().to_owned(),
            fingerprint: map.fingerprint().as_str().to_owned(),
            synced_at: map.synced_at(),
        }
    }
}

impl TryFrom<EntityMapRow> for ThirdPartyEntityMap {
    type Error = WhippetRepositoryError;

    fn try_from(row: EntityMapRow) -> Result<Self, Self::Error> {
        let system = ThirdPartySystem::try_from(row.system.as_str())
            .map_err(WhippetRepositoryError::invalid_persisted_data)?;
        let authority = Authority::try_from(row.authority.as_str())
            .map_err(WhippetRepositoryError::invalid_persisted_data)?;
        Ok(Self::from_persisted(PersistedEntityMapData {
            scope: EntityMapScope::new(TenantId::from_uuid(row.tenant_id), system, row.entity_type),
            internal_key: row.internal_key,
            external_id: row.external_id,
            authority,
            fingerprint: EntityFingerprint::from_hex(row.fingerprint),
            synced_at: row.synced_at,
        }))
    }
}

/// Owned copy of a scope that can move onto the blocking pool.
struct ScopeFilter {
    tenant_id: Uuid,
    system: &'static str,
    entity_type: String,
}

impl From<&EntityMapScope> for ScopeFilter {
    fn from(scope: &EntityMapScope) -> Self {
        Self {
            tenant_id: scope.tenant_id.into_inner(),
            system: scope.system.as_str(),
            entity_type: scope.entity_type.clone(),
        }
    }
}

impl ScopeFilter {
    fn query(&self) -> maps::BoxedQuery<'_, diesel::pg::Pg> {
        maps::table
            .filter(maps::tenant_id.eq(self.tenant_id))
            .filter(maps::system.eq(self.system))
            .filter(maps::entity_type.eq(&self.entity_type))
            .into_boxed()
    }
}

fn access_error(err: PgAccessError) -> WhippetRepositoryError {
    WhippetRepositoryError::persistence(err)
}

fn load_optional(
    connection: &mut PgConnection,
    query: maps::BoxedQuery<'_, diesel::pg::Pg>,
) -> WhippetRepositoryResult<Option<ThirdPartyEntityMap>> {
    query
        .select(EntityMapRow::as_select())
        .first::<EntityMapRow>(connection)
        .optional()
        .map_err(WhippetRepositoryError::persistence)?
        .map(ThirdPartyEntityMap::try_from)
        .transpose()
}

/// `PostgreSQL`-backed entity-map repository.
#[derive(Debug, Clone)]
pub struct PostgresEntityMapRepository {
    pool: PgPool,
}

impl PostgresEntityMapRepository {
    /// Creates a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityMapQueries for PostgresEntityMapRepository {
    async fn find(
        &self,
        scope: &EntityMapScope,
        internal_key: &str,
    ) -> WhippetRepositoryResult<Option<ThirdPartyEntityMap>> {
        let filter = ScopeFilter::from(scope);
        let key = internal_key.to_owned();
        run_with_connection(&self.pool, access_error, move |connection| {
            load_optional(connection, filter.query().filter(maps::internal_key.eq(&key)))
        })
        .await
    }

    async fn find_by_external_id(
        &self,
        scope: &EntityMapScope,
        external_id: &str,
    ) -> WhippetRepositoryResult<Option<ThirdPartyEntityMap>> {
        let filter = ScopeFilter::from(scope);
        let id = external_id.to_owned();
        run_with_connection(&self.pool, access_error, move |connection| {
            load_optional(connection, filter.query().filter(maps::external_id.eq(&id)))
        })
        .await
    }

    async fn list(
        &self,
        scope: &EntityMapScope,
    ) -> WhippetRepositoryResult<Vec<ThirdPartyEntityMap>> {
        let filter = ScopeFilter::from(scope);
        run_with_connection(&self.pool, access_error, move |connection| {
            filter
                .query()
                .order(maps::internal_key.asc())
                .select(EntityMapRow::as_select())
                .load::<EntityMapRow>(connection)
                .map_err(WhippetRepositoryError::persistence)?
                .into_iter()
                .map(ThirdPartyEntityMap::try_from)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl EntityMapCommands for PostgresEntityMapRepository {
    async fn upsert(&self, map: &ThirdPartyEntityMap) -> WhippetRepositoryResult<()> {
        let row = EntityMapRow::from(map);
        run_with_connection(&self.pool, access_error, move |connection| {
            diesel::insert_into(maps::table)
                .values(&row)
                .on_conflict((
                    maps::tenant_id,
                    maps::system,
                    maps::entity_type,
                    maps::internal_key,
                ))
                .do_update()
                .set((
                    maps::external_id.eq(excluded(maps::external_id)),
                    maps::authority.eq(excluded(maps::authority)),
                    maps::fingerprint.eq(excluded(maps::fingerprint)),
                    maps::synced_at.eq(excluded(maps::synced_at)),
                ))
                .execute(connection)
                .map_err(WhippetRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn remove(
        &self,
        scope: &EntityMapScope,
        internal_key: &str,
    ) -> WhippetRepositoryResult<bool> {
        let filter = ScopeFilter::from(scope);
        let key = internal_key.to_owned();
        run_with_connection(&self.pool, access_error, move |connection| {
            let affected = diesel::delete(
                maps::table
                    .filter(maps::tenant_id.eq(filter.tenant_id))
                    .filter(maps::system.eq(filter.system))
                    .filter(maps::entity_type.eq(&filter.entity_type))
                    .filter(maps::internal_key.eq(&key)),
            )
            .execute(connection)
            .map_err(WhippetRepositoryError::persistence)?;
            Ok(affected > 0)
        })
        .await
    }
}
