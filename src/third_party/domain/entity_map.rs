//! Pairing between Whippet-side records and their third-party counterparts.

use crate::whippet::domain::{ParseWhippetEnumError, TenantId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// External system a record is mirrored into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThirdPartySystem {
    /// Adobe Commerce / Magento.
    Magento,
    /// Multichannel Order Manager.
    Mom,
    /// Salesforce CRM.
    Salesforce,
}

impl ThirdPartySystem {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Magento => "magento",
            Self::Mom => "mom",
            Self::Salesforce => "salesforce",
        }
    }
}

impl fmt::Display for ThirdPartySystem {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ThirdPartySystem {
    type Error = ParseWhippetEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "magento" => Ok(Self::Magento),
            "mom" => Ok(Self::Mom),
            "salesforce" => Ok(Self::Salesforce),
            _ => Err(ParseWhippetEnumError::new("third-party system", value)),
        }
    }
}

/// Which side of a mapping is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// Whippet (and the systems it reads from) owns the record; the third
    /// party holds a copy.
    Internal,
    /// The third party owns the record; synchronization must not touch it.
    External,
}

impl Authority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

impl TryFrom<&str> for Authority {
    type Error = ParseWhippetEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            _ => Err(ParseWhippetEnumError::new("authority", value)),
        }
    }
}

/// SHA-256 fingerprint of a record's canonical JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityFingerprint(String);

impl EntityFingerprint {
    /// Fingerprints a serializable payload.
    ///
    /// The payload is first converted to a JSON value, whose object keys are
    /// sorted, so field declaration order does not affect the digest.
    ///
    /// # Errors
    ///
    /// Returns the serialization error when the payload cannot be encoded.
    pub fn of(payload: &impl Serialize) -> Result<Self, serde_json::Error> {
        let canonical = serde_json::to_value(payload)?.to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        Ok(Self(format!("{digest:x}")))
    }

    /// Wraps a previously computed fingerprint.
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the lowercase hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of a group of mappings: one tenant, one system, one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityMapScope {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// External system.
    pub system: ThirdPartySystem,
    /// Entity type label, such as `tax_rate`.
    pub entity_type: String,
}

impl EntityMapScope {
    /// Creates a mapping scope.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        system: ThirdPartySystem,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            system,
            entity_type: entity_type.into(),
        }
    }
}

/// Links an internal record key to the identifier the third party assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyEntityMap {
    tenant_id: TenantId,
    system: ThirdPartySystem,
    entity_type: String,
    internal_key: String,
    external_id: String,
    authority: Authority,
    fingerprint: EntityFingerprint,
    synced_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedEntityMapData {
    /// Mapping scope.
    pub scope: EntityMapScope,
    /// Internal record key.
    pub internal_key: String,
    /// Third-party identifier.
    pub external_id: String,
    /// Source of truth.
    pub authority: Authority,
    /// Fingerprint of the last synchronized payload.
    pub fingerprint: EntityFingerprint,
    /// Time of the last synchronization.
    pub synced_at: DateTime<Utc>,
}

impl ThirdPartyEntityMap {
    /// Creates a mapping stamped with the current time.
    #[must_use]
    pub fn new(
        scope: EntityMapScope,
        internal_key: impl Into<String>,
        external_id: impl Into<String>,
        authority: Authority,
        fingerprint: EntityFingerprint,
        clock: &impl Clock,
    ) -> Self {
        Self {
            tenant_id: scope.tenant_id,
            system: scope.system,
            entity_type: scope.entity_type,
            internal_key: internal_key.into(),
            external_id: external_id.into(),
            authority,
            fingerprint,
            synced_at: clock.utc(),
        }
    }

    /// Reconstructs a mapping from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEntityMapData) -> Self {
        Self {
            tenant_id: data.scope.tenant_id,
            system: data.scope.system,
            entity_type: data.scope.entity_type,
            internal_key: data.internal_key,
            external_id: data.external_id,
            authority: data.authority,
            fingerprint: data.fingerprint,
            synced_at: data.synced_at,
        }
    }

    /// Returns the mapping scope.
    #[must_use]
    pub fn scope(&self) -> EntityMapScope {
        EntityMapScope::new(self.tenant_id, self.system, self.entity_type.clone())
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the external system.
    #[must_use]
    pub const fn system(&self) -> ThirdPartySystem {
        self.system
    }

    /// Returns the entity type label.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the internal record key.
    #[must_use]
    pub fn internal_key(&self) -> &str {
        &self.internal_key
    }

    /// Returns the third-party identifier.
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Returns the source of truth.
    #[must_use]
    pub const fn authority(&self) -> Authority {
        self.authority
    }

    /// Returns the fingerprint of the last synchronized payload.
    #[must_use]
    pub const fn fingerprint(&self) -> &EntityFingerprint {
        &self.fingerprint
    }

    /// Returns the time of the last synchronization.
    #[must_use]
    pub const fn synced_at(&self) -> DateTime<Utc> {
        self.synced_at
    }

    /// Returns whether `fingerprint` matches the last synchronized payload.
    #[must_use]
    pub fn is_unchanged(&self, fingerprint: &EntityFingerprint) -> bool {
        self.fingerprint == *fingerprint
    }

    /// Records a successful synchronization.
    pub fn record_sync(
        &mut self,
        external_id: impl Into<String>,
        fingerprint: EntityFingerprint,
        clock: &impl Clock,
    ) {
        self.external_id = external_id.into();
        self.fingerprint = fingerprint;
        self.synced_at = clock.utc();
    }
}
