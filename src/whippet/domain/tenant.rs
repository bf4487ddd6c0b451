//! Tenant aggregate.

use super::{TenantCode, TenantId, WhippetDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A customer organisation whose systems are integrated by Whippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    id: TenantId,
    code: TenantCode,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTenantData {
    /// Persisted tenant identifier.
    pub id: TenantId,
    /// Persisted tenant code.
    pub code: TenantCode,
    /// Persisted display name.
    pub name: String,
    /// Persisted activation flag.
    pub is_active: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Creates a new active tenant.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::EmptyName`] when the name is blank.
    pub fn new(
        code: TenantCode,
        name: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, WhippetDomainError> {
        let timestamp = clock.utc();
        Ok(Self {
            id: TenantId::new(),
            code,
            name: normalize_name(name.into(), "tenant")?,
            is_active: true,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a tenant from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTenantData) -> Self {
        Self {
            id: data.id,
            code: data.code,
            name: data.name,
            is_active: data.is_active,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub const fn id(&self) -> TenantId {
        self.id
    }

    /// Returns the tenant code.
    #[must_use]
    pub const fn code(&self) -> &TenantCode {
        &self.code
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the tenant is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Deactivates the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::AlreadyInactive`] when the tenant is
    /// already inactive.
    pub fn deactivate(&mut self, clock: &impl Clock) -> Result<(), WhippetDomainError> {
        if !self.is_active {
            return Err(WhippetDomainError::AlreadyInactive);
        }
        self.is_active = false;
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Reactivates the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::AlreadyActive`] when the tenant is
    /// already active.
    pub fn activate(&mut self, clock: &impl Clock) -> Result<(), WhippetDomainError> {
        if self.is_active {
            return Err(WhippetDomainError::AlreadyActive);
        }
        self.is_active = true;
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Renames the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::EmptyName`] when the name is blank.
    pub fn rename(
        &mut self,
        name: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), WhippetDomainError> {
        self.name = normalize_name(name.into(), "tenant")?;
        self.updated_at = clock.utc();
        Ok(())
    }
}

/// Trims a display name and rejects blank values.
pub(super) fn normalize_name(
    name: String,
    entity: &'static str,
) -> Result<String, WhippetDomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WhippetDomainError::EmptyName(entity));
    }
    Ok(trimmed.to_owned())
}
