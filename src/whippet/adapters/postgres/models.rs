//! Diesel row models for Whippet entities and their domain conversions.

use super::schema::{applications, jobs, settings, tenants};
use crate::whippet::{
    domain::{
        Application, ApplicationId, ApplicationKind, Job, JobId, JobKind, JobStatus,
        PersistedApplicationData, PersistedJobData, PersistedSettingData, PersistedTenantData,
        Setting, SettingId, SettingKey, Tenant, TenantCode, TenantId,
    },
    ports::WhippetRepositoryError,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Row model for `tenants`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tenants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TenantRow {
    /// Tenant identifier.
    pub id: Uuid,
    /// Unique tenant slug.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Activation flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Tenant> for TenantRow {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id().into_inner(),
            code: tenant.code().as_str().to_owned(),
            name: tenant.name().to_owned(),
            is_active: tenant.is_active(),
            created_at: tenant.created_at(),
            updated_at: tenant.updated_at(),
        }
    }
}

impl TryFrom<TenantRow> for Tenant {
    type Error = WhippetRepositoryError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        let code =
            TenantCode::new(row.code).map_err(WhippetRepositoryError::invalid_persisted_data)?;
        Ok(Self::from_persisted(PersistedTenantData {
            id: TenantId::from_uuid(row.id),
            code,
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

/// Row model for `applications`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ApplicationRow {
    /// Application identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Application kind.
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Optional base URL.
    pub base_url: Option<String>,
    /// Enablement flag.
    pub is_enabled: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Application> for ApplicationRow {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id().into_inner(),
            tenant_id: application.tenant_id().into_inner(),
            kind: application.kind().as_str().to_owned(),
            name: application.name().to_owned(),
            base_url: application.base_url().map(str::to_owned),
            is_enabled: application.is_enabled(),
            created_at: application.created_at(),
            updated_at: application.updated_at(),
        }
    }
}

impl TryFrom<ApplicationRow> for Application {
    type Error = WhippetRepositoryError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let kind = ApplicationKind::try_from(row.kind.as_str())
            .map_err(WhippetRepositoryError::invalid_persisted_data)?;
        Ok(Self::from_persisted(PersistedApplicationData {
            id: ApplicationId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            kind,
            name: row.name,
            base_url: row.base_url,
            is_enabled: row.is_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

/// Row model for `settings`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SettingRow {
    /// Setting identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Optional application scope.
    pub application_id: Option<Uuid>,
    /// Dotted setting key.
    pub key: String,
    /// Raw setting value.
    pub value: String,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Setting> for SettingRow {
    fn from(setting: &Setting) -> Self {
        Self {
            id: setting.id().into_inner(),
            tenant_id: setting.tenant_id().into_inner(),
            application_id: setting.application_id().map(ApplicationId::into_inner),
            key: setting.key().as_str().to_owned(),
            value: setting.value().to_owned(),
            updated_at: setting.updated_at(),
        }
    }
}

impl TryFrom<SettingRow> for Setting {
    type Error = WhippetRepositoryError;

    fn try_from(row: SettingRow) -> Result<Self, Self::Error> {
        let key = SettingKey::new(row.key).map_err(WhippetRepositoryError::invalid_persisted_data)?;
        Ok(Self::from_persisted(PersistedSettingData {
            id: SettingId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            application_id: row.application_id.map(ApplicationId::from_uuid),
            key,
            value: row.value,
            updated_at: row.updated_at,
        }))
    }
}

/// Row model for `jobs`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct JobRow {
    /// Job identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Job kind.
    pub kind: String,
    /// Lifecycle state.
    pub status: String,
    /// External reference.
    pub external_ref: Option<String>,
    /// Outcome detail.
    pub detail: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id().into_inner(),
            tenant_id: job.tenant_id().into_inner(),
            kind: job.kind().as_str().to_owned(),
            status: job.status().as_str().to_owned(),
            external_ref: job.external_ref().map(str::to_owned),
            detail: job.detail().map(str::to_owned),
            created_at: job.created_at(),
            updated_at: job.updated_at(),
            completed_at: job.completed_at(),
        }
    }
}

impl TryFrom<JobRow> for Job {
    type Error = WhippetRepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let kind = JobKind::try_from(row.kind.as_str())
            .map_err(WhippetRepositoryError::invalid_persisted_data)?;
        let status = JobStatus::try_from(row.status.as_str())
            .map_err(WhippetRepositoryError::invalid_persisted_data)?;
        Ok(Self::from_persisted(PersistedJobData {
            id: JobId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            kind,
            status,
            external_ref: row.external_ref,
            detail: row.detail,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        }))
    }
}
