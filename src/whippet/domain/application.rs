//! Tenant application registrations for integrated third-party systems.

use super::{ApplicationId, ParseWhippetEnumError, TenantId, WhippetDomainError, tenant};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of external system an application connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationKind {
    /// Adobe Commerce / Magento storefront.
    Magento,
    /// Multichannel Order Manager.
    Mom,
    /// Salesforce CRM.
    Salesforce,
}

impl ApplicationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Magento => "magento",
            Self::Mom => "mom",
            Self::Salesforce => "salesforce",
        }
    }

    const fn requires_base_url(self) -> bool {
        matches!(self, Self::Magento | Self::Salesforce)
    }
}

impl fmt::Display for ApplicationKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ApplicationKind {
    type Error = ParseWhippetEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "magento" => Ok(Self::Magento),
            "mom" => Ok(Self::Mom),
            "salesforce" => Ok(Self::Salesforce),
            _ => Err(ParseWhippetEnumError::new("application kind", value)),
        }
    }
}

/// An external system registered for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    id: ApplicationId,
    tenant_id: TenantId,
    kind: ApplicationKind,
    name: String,
    base_url: Option<String>,
    is_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedApplicationData {
    /// Persisted application identifier.
    pub id: ApplicationId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Persisted application kind.
    pub kind: ApplicationKind,
    /// Persisted display name.
    pub name: String,
    /// Persisted base URL.
    pub base_url: Option<String>,
    /// Persisted enablement flag.
    pub is_enabled: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Creates a new enabled application.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::EmptyName`] for a blank name or
    /// [`WhippetDomainError::InvalidBaseUrl`] when a Magento or Salesforce
    /// application lacks an `http(s)` base URL.
    pub fn new(
        tenant_id: TenantId,
        kind: ApplicationKind,
        name: impl Into<String>,
        base_url: Option<String>,
        clock: &impl Clock,
    ) -> Result<Self, WhippetDomainError> {
        let timestamp = clock.utc();
        Ok(Self {
            id: ApplicationId::new(),
            tenant_id,
            kind,
            name: tenant::normalize_name(name.into(), "application")?,
            base_url: normalize_base_url(kind, base_url)?,
            is_enabled: true,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs an application from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedApplicationData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            kind: data.kind,
            name: data.name,
            base_url: data.base_url,
            is_enabled: data.is_enabled,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the application identifier.
    #[must_use]
    pub const fn id(&self) -> ApplicationId {
        self.id
    }

    /// Returns the owning tenant identifier.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the application kind.
    #[must_use]
    pub const fn kind(&self) -> ApplicationKind {
        self.kind
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized base URL, if any.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Returns whether the application is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.is_enabled
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

    /// Enables the application. Enabling an enabled application is a no-op.
    pub fn enable(&mut self, clock: &impl Clock) {
        if !self.is_enabled {
            self.is_enabled = true;
            self.updated_at = clock.utc();
        }
    }

    /// Disables the application. Disabling a disabled application is a no-op.
    pub fn disable(&mut self, clock: &impl Clock) {
        if self.is_enabled {
            self.is_enabled = false;
            self.updated_at = clock.utc();
        }
    }
}

fn normalize_base_url(
    kind: ApplicationKind,
    base_url: Option<String>,
) -> Result<Option<String>, WhippetDomainError> {
    let Some(raw) = base_url else {
        if kind.requires_base_url() {
            return Err(WhippetDomainError::InvalidBaseUrl(String::new()));
        }
        return Ok(None);
    };

    let trimmed = raw.trim().trim_end_matches('/');
    let has_scheme = trimmed.starts_with("https://") || trimmed.starts_with("http://");
    let has_host = trimmed
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.is_empty());
    if !has_scheme || !has_host || trimmed.chars().any(char::is_whitespace) {
        return Err(WhippetDomainError::InvalidBaseUrl(raw));
    }
    Ok(Some(trimmed.to_owned()))
}
