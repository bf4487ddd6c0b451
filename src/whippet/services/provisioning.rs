//! Service layer for tenant, application and setting provisioning.

use crate::whippet::{
    domain::{
        Application, ApplicationId, ApplicationKind, Setting, SettingKey, Tenant, TenantCode,
        TenantId, WhippetDomainError,
    },
    ports::{
        ApplicationCommands, ApplicationQueries, SettingCommands, SettingQueries, TenantCommands,
        TenantQueries, WhippetRepositoryError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for registering a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterTenantRequest {
    /// Tenant slug.
    pub code: String,
    /// Display name.
    pub name: String,
}

impl RegisterTenantRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Request payload for registering an application for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterApplicationRequest {
    tenant_id: TenantId,
    kind: ApplicationKind,
    name: String,
    base_url: Option<String>,
}

impl RegisterApplicationRequest {
    /// Creates a registration request without a base URL.
    #[must_use]
    pub fn new(tenant_id: TenantId, kind: ApplicationKind, name: impl Into<String>) -> Self {
        Self {
            tenant_id,
            kind,
            name: name.into(),
            base_url: None,
        }
    }

    /// Sets the application base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Request payload for storing a setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSettingRequest {
    tenant_id: TenantId,
    application_id: Option<ApplicationId>,
    key: String,
    value: String,
}

impl SetSettingRequest {
    /// Creates a tenant-wide setting request.
    #[must_use]
    pub fn tenant_wide(
        tenant_id: TenantId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            application_id: None,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Narrows the setting to one application.
    #[must_use]
    pub const fn for_application(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }
}

/// Service-level errors for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WhippetDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] WhippetRepositoryError),
    /// The referenced tenant does not exist.
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),
    /// The referenced tenant is deactivated.
    #[error("tenant {0} is inactive")]
    TenantInactive(TenantId),
    /// The referenced application does not belong to the tenant.
    #[error("application {application_id} does not belong to tenant {tenant_id}")]
    ForeignApplication {
        /// Tenant named by the request.
        tenant_id: TenantId,
        /// Application named by the request.
        application_id: ApplicationId,
    },
}

/// Result type for provisioning service operations.
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

/// Tenant provisioning orchestration service.
#[derive(Clone)]
pub struct TenantProvisioningService<T, A, S, C>
where
    T: TenantQueries + TenantCommands,
    A: ApplicationQueries + ApplicationCommands,
    S: SettingQueries + SettingCommands,
    C: Clock + Send + Sync,
{
    tenants: Arc<T>,
    applications: Arc<A>,
    settings: Arc<S>,
    clock: Arc<C>,
}

impl<T, A, S, C> TenantProvisioningService<T, A, S, C>
where
    T: TenantQueries + TenantCommands,
    A: ApplicationQueries + ApplicationCommands,
    S: SettingQueries + SettingCommands,
    C: Clock + Send + Sync,
{
    /// Creates a new provisioning service.
    #[must_use]
    pub const fn new(
        tenants: Arc<T>,
        applications: Arc<A>,
        settings: Arc<S>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tenants,
            applications,
            settings,
            clock,
        }
    }

    async fn active_tenant(&self, tenant_id: TenantId) -> ProvisioningResult<Tenant> {
        let tenant = TenantQueries::find_by_id(&*self.tenants, tenant_id)
            .await?
            .ok_or(ProvisioningError::TenantNotFound(tenant_id))?;
        if !tenant.is_active() {
            return Err(ProvisioningError::TenantInactive(tenant_id));
        }
        Ok(tenant)
    }

    async fn owned_application(
        &self,
        tenant_id: TenantId,
        application_id: ApplicationId,
    ) -> ProvisioningResult<Application> {
        ApplicationQueries::find_by_id(&*self.applications, application_id)
            .await?
            .filter(|application| application.tenant_id() == tenant_id)
            .ok_or(ProvisioningError::ForeignApplication {
                tenant_id,
                application_id,
            })
    }

    /// Registers a new active tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Domain`] for an invalid code or name and
    /// [`ProvisioningError::Repository`] when the code is already taken.
    pub async fn register_tenant(
        &self,
        request: RegisterTenantRequest,
    ) -> ProvisioningResult<Tenant> {
        let code = TenantCode::new(request.code)?;
        let tenant = Tenant::new(code, request.name, &*self.clock)?;
        self.tenants.insert(&tenant).await?;
        tracing::info!(tenant = %tenant.code(), tenant_id = %tenant.id(), "tenant registered");
        Ok(tenant)
    }

    /// Finds a tenant by its code.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an invalid code and repository errors from
    /// the lookup.
    pub async fn find_tenant_by_code(&self, code: &str) -> ProvisioningResult<Option<Tenant>> {
        let validated = TenantCode::new(code)?;
        Ok(self.tenants.find_by_code(&validated).await?)
    }

    /// Deactivates a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::TenantNotFound`] for an unknown tenant and
    /// [`WhippetDomainError::AlreadyInactive`] when it is already inactive.
    pub async fn deactivate_tenant(&self, tenant_id: TenantId) -> ProvisioningResult<Tenant> {
        let mut tenant = TenantQueries::find_by_id(&*self.tenants, tenant_id)
            .await?
            .ok_or(ProvisioningError::TenantNotFound(tenant_id))?;
        tenant.deactivate(&*self.clock)?;
        self.tenants.update(&tenant).await?;
        tracing::info!(tenant = %tenant.code(), "tenant deactivated");
        Ok(tenant)
    }

    /// Registers an application for an active tenant.
    ///
    /// # Errors
    ///
    /// Returns tenant lookup errors, domain validation errors and repository
    /// errors.
    pub async fn register_application(
        &self,
        request: RegisterApplicationRequest,
    ) -> ProvisioningResult<Application> {
        let tenant = self.active_tenant(request.tenant_id).await?;
        let application = Application::new(
            tenant.id(),
            request.kind,
            request.name,
            request.base_url,
            &*self.clock,
        )?;
        self.applications.insert(&application).await?;
        tracing::info!(
            tenant = %tenant.code(),
            application_id = %application.id(),
            kind = %application.kind(),
            "application registered"
        );
        Ok(application)
    }

    /// Stores a setting value, replacing any value in the same scope.
    ///
    /// # Errors
    ///
    /// Returns tenant lookup errors, [`ProvisioningError::ForeignApplication`]
    /// when the application belongs to another tenant, domain errors for an
    /// invalid key and repository errors.
    pub async fn set_setting(&self, request: SetSettingRequest) -> ProvisioningResult<Setting> {
        let tenant = self.active_tenant(request.tenant_id).await?;
        if let Some(application_id) = request.application_id {
            self.owned_application(tenant.id(), application_id).await?;
        }
        let key = SettingKey::new(request.key)?;
        let setting = Setting::new(
            tenant.id(),
            request.application_id,
            key,
            request.value,
            &*self.clock,
        );
        let persisted = self.settings.upsert(&setting).await?;
        tracing::debug!(tenant = %tenant.code(), key = %persisted.key(), "setting stored");
        Ok(persisted)
    }

    /// Resolves the effective setting for a key, falling back from the
    /// application scope to the tenant-wide value.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an invalid key and repository errors.
    pub async fn resolve_setting(
        &self,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: &str,
    ) -> ProvisioningResult<Option<Setting>> {
        let validated = SettingKey::new(key)?;
        Ok(self.settings.find(tenant_id, application_id, &validated).await?)
    }
}
