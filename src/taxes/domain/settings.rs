//! Per-tenant tax synchronization settings.

use crate::whippet::{
    domain::{ApplicationId, SettingKey, TenantId, WhippetDomainError},
    ports::{SettingQueries, WhippetRepositoryError},
};
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

const CACHE_TTL_KEY: &str = "tax.cache_ttl_minutes";
const BULK_BATCH_SIZE_KEY: &str = "tax.bulk_batch_size";
const MANAGED_CODE_PREFIX_KEY: &str = "tax.managed_code_prefix";
const DELETE_ORPHANS_KEY: &str = "tax.delete_orphans";

/// Knobs controlling one tax sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxSyncSettings {
    /// Maximum age of the MOM snapshot before it is reloaded.
    pub cache_ttl: Duration,
    /// Payloads per Magento bulk.
    pub bulk_batch_size: NonZeroUsize,
    /// Code prefix marking rates Whippet created in Magento.
    pub managed_code_prefix: String,
    /// Whether managed rates MOM no longer has are deleted.
    pub delete_orphans: bool,
}

impl Default for TaxSyncSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60 * 60),
            bulk_batch_size: NonZeroUsize::MIN.saturating_add(99),
            managed_code_prefix: "WHP-".to_owned(),
            delete_orphans: true,
        }
    }
}

/// Failures resolving stored tax settings.
#[derive(Debug, Error)]
pub enum TaxSettingsError {
    /// A stored value has the wrong shape.
    #[error(transparent)]
    Domain(#[from] WhippetDomainError),
    /// Settings could not be read.
    #[error(transparent)]
    Repository(#[from] WhippetRepositoryError),
}

impl TaxSyncSettings {
    /// Overlays stored settings on `defaults`.
    ///
    /// Application-scoped values win over tenant-wide ones; keys without a
    /// stored value keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`TaxSettingsError`] when a stored value is malformed, the
    /// batch size is zero, the prefix is blank, or the lookup fails.
    pub async fn resolve<S>(
        settings: &S,
        tenant_id: TenantId,
        application_id: Option<ApplicationId>,
        defaults: Self,
    ) -> Result<Self, TaxSettingsError>
    where
        S: SettingQueries + ?Sized,
    {
        let mut resolved = defaults;
        let lookup = |key: &'static str| async move {
            let setting_key = SettingKey::new(key)?;
            Ok::<_, TaxSettingsError>(settings.find(tenant_id, application_id, &setting_key).await?)
        };

        if let Some(ttl) = lookup(CACHE_TTL_KEY).await? {
            resolved.cache_ttl = ttl.as_minutes()?;
        }
        if let Some(batch) = lookup(BULK_BATCH_SIZE_KEY).await? {
            resolved.bulk_batch_size = usize::try_from(batch.as_u64()?)
                .ok()
                .and_then(NonZeroUsize::new)
                .ok_or_else(|| {
                    invalid(BULK_BATCH_SIZE_KEY, batch.value(), "a positive batch size")
                })?;
        }
        if let Some(prefix) = lookup(MANAGED_CODE_PREFIX_KEY).await? {
            if prefix.value().is_empty() {
                return Err(
                    invalid(MANAGED_CODE_PREFIX_KEY, prefix.value(), "a non-empty prefix").into(),
                );
            }
            resolved.managed_code_prefix = prefix.value().to_owned();
        }
        if let Some(flag) = lookup(DELETE_ORPHANS_KEY).await? {
            resolved.delete_orphans = flag.as_bool()?;
        }
        Ok(resolved)
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> WhippetDomainError {
    WhippetDomainError::InvalidSettingValue {
        key: key.to_owned(),
        value: value.to_owned(),
        expected,
    }
}
