//! Tenant and application scoped settings.

use super::{ApplicationId, SettingId, TenantId, WhippetDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Validated dotted setting key such as `tax.cache_ttl_minutes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingKey(String);

impl SettingKey {
    /// Creates a validated setting key.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidSettingKey`] when any dotted
    /// segment is empty or contains characters other than `[a-z0-9_]`.
    pub fn new(value: impl Into<String>) -> Result<Self, WhippetDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        let is_valid = !normalized.is_empty()
            && normalized.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
            });
        if !is_valid {
            return Err(WhippetDomainError::InvalidSettingKey(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A configuration value stored for a tenant, optionally narrowed to one
/// application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    id: SettingId,
    tenant_id: TenantId,
    application_id: Option<ApplicationId>,
    key: SettingKey,
    value: String,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSettingData {
    /// Persisted setting identifier.
    pub id: SettingId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Optional application scope.
    pub application_id: Option<ApplicationId>,
    /// Persisted key.
    pub key: SettingKey,
    /// Persisted raw value.
    pub value: String,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// Creates a new setting value.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        key: SettingKey,
        value: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: SettingId::new(),
            tenant_id,
            application_id,
            key,
            value: value.into().trim().to_owned(),
            updated_at: clock.utc(),
        }
    }

    /// Reconstructs a setting from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSettingData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            application_id: data.application_id,
            key: data.key,
            value: data.value,
            updated_at: data.updated_at,
        }
    }

    /// Returns the setting identifier.
    #[must_use]
    pub const fn id(&self) -> SettingId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the application scope, if any.
    #[must_use]
    pub const fn application_id(&self) -> Option<ApplicationId> {
        self.application_id
    }

    /// Returns the key.
    #[must_use]
    pub const fn key(&self) -> &SettingKey {
        &self.key
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Keeps the identity of `self` while taking the value and timestamp of
    /// `replacement`.
    #[must_use]
    pub fn replaced_by(&self, replacement: &Self) -> Self {
        Self {
            value: replacement.value.clone(),
            updated_at: replacement.updated_at,
            ..self.clone()
        }
    }

    /// Interprets the value as a boolean.
    ///
    /// Accepts `true`/`false`, `1`/`0` and `yes`/`no`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidSettingValue`] for anything else.
    pub fn as_bool(&self) -> Result<bool, WhippetDomainError> {
        match self.value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(self.invalid("a boolean")),
        }
    }

    /// Interprets the value as an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidSettingValue`] when the value is
    /// not a non-negative integer.
    pub fn as_u64(&self) -> Result<u64, WhippetDomainError> {
        self.value
            .parse::<u64>()
            .map_err(|_| self.invalid("an unsigned integer"))
    }

    /// Interprets the value as a whole number of minutes.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidSettingValue`] when the value is
    /// not a non-negative integer or overflows a [`Duration`].
    pub fn as_minutes(&self) -> Result<Duration, WhippetDomainError> {
        let minutes = self
            .as_u64()
            .map_err(|_| self.invalid("a whole number of minutes"))?;
        minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| self.invalid("a whole number of minutes"))
    }

    fn invalid(&self, expected: &'static str) -> WhippetDomainError {
        WhippetDomainError::InvalidSettingValue {
            key: self.key.to_string(),
            value: self.value.clone(),
            expected,
        }
    }
}
