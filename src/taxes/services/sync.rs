//! MOM to Magento tax-rate reconciliation.

use super::{TaxRateSnapshot, TaxRateSyncCache};
use crate::magento::{
    domain::{BulkMethod, MagentoTaxRate, TAX_RATE_TOPIC, managed_key},
    ports::{MagentoBulkSupport, MagentoError, MagentoTaxRateGateway},
    services::{BulkCommandError, BulkCommandOptions, BulkCommandReport, MagentoBulkCommand},
};
use crate::mom::{
    domain::MomTaxRate,
    ports::{MomError, MomTaxRateSource},
};
use crate::taxes::domain::{TaxSyncReport, TaxSyncSettings};
use crate::third_party::{
    domain::{
        Authority, EntityFingerprint, EntityMapScope, ReconcilePolicy, SkipReason, SyncDecision,
        ThirdPartyEntityMap, ThirdPartySystem, reconcile,
    },
    ports::{EntityMapCommands, EntityMapQueries},
};
use crate::whippet::{
    domain::{Job, JobKind, TenantId, WhippetDomainError},
    ports::{JobCommands, WhippetRepositoryError},
};
use mockable::Clock;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Entity type label of tax-rate mappings.
pub const TAX_RATE_ENTITY: &str = "tax_rate";

/// Key prefix for Magento rates whose code Whippet does not manage.
const UNMANAGED_KEY_PREFIX: &str = "unmanaged:";

/// Errors that abort a tax sync.
#[derive(Debug, Error)]
pub enum TaxSyncError {
    /// MOM could not be read.
    #[error(transparent)]
    Mom(#[from] MomError),
    /// A Magento call failed.
    #[error(transparent)]
    Magento(#[from] MagentoError),
    /// A bulk submission failed.
    #[error(transparent)]
    Bulk(#[from] BulkCommandError),
    /// Whippet persistence failed.
    #[error(transparent)]
    Repository(#[from] WhippetRepositoryError),
    /// A job transition was rejected.
    #[error(transparent)]
    Domain(#[from] WhippetDomainError),
    /// A rate could not be encoded.
    #[error("failed to encode tax rate: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for tax sync operations.
pub type TaxSyncResult<T> = Result<T, TaxSyncError>;

/// Writes planned by reconciliation.
#[derive(Default)]
struct SyncPlan {
    creates: Vec<(String, MagentoTaxRate)>,
    updates: Vec<(String, MagentoTaxRate)>,
    deletes: Vec<(String, MagentoTaxRate)>,
    unchanged: Vec<(String, MagentoTaxRate, MagentoTaxRate)>,
}

/// Keeps Magento's tax rates in line with MOM for one tenant at a time.
pub struct TaxRateSyncService<S, G, E, J, C>
where
    S: MomTaxRateSource,
    G: MagentoTaxRateGateway + MagentoBulkSupport,
    E: EntityMapQueries + EntityMapCommands,
    J: JobCommands,
    C: Clock + Send + Sync,
{
    source: Arc<S>,
    magento: Arc<G>,
    maps: Arc<E>,
    jobs: Arc<J>,
    clock: Arc<C>,
    cache: TaxRateSyncCache<C>,
    bulk_options: BulkCommandOptions,
}

impl<S, G, E, J, C> TaxRateSyncService<S, G, E, J, C>
where
    S: MomTaxRateSource,
    G: MagentoTaxRateGateway + MagentoBulkSupport,
    E: EntityMapQueries + EntityMapCommands,
    J: JobCommands,
    C: Clock + Send + Sync,
{
    /// Creates a sync service with its own MOM cache.
    ///
    /// The bulk batch size in `bulk_options` is replaced per sync by the
    /// tenant's settings; the polling limits are kept.
    #[must_use]
    pub fn new(
        source: Arc<S>,
        magento: Arc<G>,
        maps: Arc<E>,
        jobs: Arc<J>,
        clock: Arc<C>,
        bulk_options: BulkCommandOptions,
    ) -> Self {
        let cache = TaxRateSyncCache::new(TaxSyncSettings::default().cache_ttl, Arc::clone(&clock));
        Self {
            source,
            magento,
            maps,
            jobs,
            clock,
            cache,
            bulk_options,
        }
    }

    /// Returns the MOM cache shared by syncs and lookups.
    #[must_use]
    pub const fn cache(&self) -> &TaxRateSyncCache<C> {
        &self.cache
    }

    /// Looks up the MOM rate for a destination through the cache.
    ///
    /// # Errors
    ///
    /// Returns [`TaxSyncError::Mom`] when the destination is malformed or the
    /// cache cannot be refreshed.
    pub async fn tax_rate_for(
        &self,
        country: &str,
        region: &str,
        postcode: &str,
    ) -> TaxSyncResult<Option<MomTaxRate>> {
        Ok(self
            .cache
            .rate_for(&*self.source, country, region, postcode)
            .await?)
    }

    /// Reconciles Magento's tax rates against MOM for `tenant_id`.
    ///
    /// The sync is tracked as a [`JobKind::TaxRateSync`] job that succeeds
    /// only when every write reached Magento.
    ///
    /// # Errors
    ///
    /// Returns [`TaxSyncError`] when MOM, Magento or Whippet persistence
    /// fails. The job is marked failed before the error is returned.
    pub async fn sync(
        &self,
        tenant_id: TenantId,
        settings: &TaxSyncSettings,
    ) -> TaxSyncResult<TaxSyncReport> {
        let mut job = Job::new(tenant_id, JobKind::TaxRateSync, &*self.clock);
        self.jobs.insert(&job).await?;
        job.start(None, &*self.clock)?;
        self.jobs.update(&job).await?;

        match self.run(&job, settings).await {
            Ok(report) => {
                if report.is_success() {
                    job.succeed(Some(report.to_string()), &*self.clock)?;
                } else {
                    job.fail(report.to_string(), &*self.clock)?;
                }
                self.jobs.update(&job).await?;
                info!(
                    tenant_id = %tenant_id,
                    job_id = %job.id(),
                    created = report.created,
                    updated = report.updated,
                    deleted = report.deleted,
                    failed_batches = report.failed_batches,
                    failed_deletes = report.failed_deletes,
                    unresolved_regions = report.unresolved_regions,
                    "tax rate sync finished"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(
                    tenant_id = %tenant_id,
                    job_id = %job.id(),
                    error = %err,
                    "tax rate sync failed"
                );
                job.fail(err.to_string(), &*self.clock)?;
                self.jobs.update(&job).await?;
                Err(err)
            }
        }
    }

    async fn run(&self, job: &Job, settings: &TaxSyncSettings) -> TaxSyncResult<TaxSyncReport> {
        let tenant_id = job.tenant_id();
        let prefix = settings.managed_code_prefix.as_str();
        let snapshot = self
            .cache
            .snapshot_with_ttl(&*self.source, settings.cache_ttl)
            .await?;
        let regions = self.directory_regions(&snapshot).await?;
        let mut report = TaxSyncReport::new(job.id(), snapshot.len());

        let mut desired = BTreeMap::new();
        let mut unresolved = BTreeSet::new();
        for rate in snapshot.rates().values() {
            let key = rate.key();
            let country_regions = regions.get(key.country());
            let region_id = match country_regions.map(|ids| ids.get(key.region())) {
                None => None,
                Some(Some(id)) => Some(*id),
                Some(None) => {
                    warn!(
                        tenant_id = %tenant_id,
                        key = %key,
                        region = key.region(),
                        "Magento does not know the region of this rate; rate skipped"
                    );
                    unresolved.insert(key.to_string());
                    continue;
                }
            };
            desired.insert(
                key.to_string(),
                MagentoTaxRate::from_mom(rate, prefix).with_region_id(region_id),
            );
        }
        report.unresolved_regions = unresolved.len();
        let mut existing = key_magento_rates(self.magento.list_tax_rates().await?, prefix);
        // Magento copies of unresolved rates are neither updated nor deleted.
        existing.retain(|key, _| !unresolved.contains(key));
        let scope = EntityMapScope::new(tenant_id, ThirdPartySystem::Magento, TAX_RATE_ENTITY);
        let maps = self.maps.list(&scope).await?;

        let decisions = reconcile(
            desired,
            existing,
            &maps,
            ReconcilePolicy {
                delete_orphans: settings.delete_orphans,
            },
            MagentoTaxRate::same_content,
            |key: &str, _rate: &MagentoTaxRate| !key.starts_with(UNMANAGED_KEY_PREFIX),
        );

        let plan = plan_writes(decisions, &mut report);

        let options = self
            .bulk_options
            .with_batch_size(settings.bulk_batch_size);
        let bulk = MagentoBulkCommand::new(
            Arc::clone(&self.magento),
            Arc::clone(&self.jobs),
            Arc::clone(&self.clock),
            options,
        );
        let created = self
            .submit(&bulk, tenant_id, BulkMethod::Post, &plan.creates)
            .await?;
        let updated = self
            .submit(&bulk, tenant_id, BulkMethod::Put, &plan.updates)
            .await?;
        report.failed_batches = created.failed_batches() + updated.failed_batches();

        self.delete_orphans(&scope, &plan.deletes, &mut report).await?;
        self.confirm_writes(&scope, &plan, &maps, &mut report).await?;
        Ok(report)
    }

    /// Loads directory region ids for every country in the snapshot.
    ///
    /// Countries without directory regions are absent from the result.
    async fn directory_regions(
        &self,
        snapshot: &TaxRateSnapshot,
    ) -> TaxSyncResult<HashMap<String, HashMap<String, u64>>> {
        let countries: BTreeSet<String> = snapshot
            .rates()
            .keys()
            .map(|key| key.country().to_owned())
            .collect();
        let mut by_country = HashMap::new();
        for country in countries {
            let regions = match self.magento.list_regions(&country).await {
                Ok(regions) => regions,
                Err(MagentoError::NotFound(_)) => {
                    debug!(country = %country, "Magento has no regions for country");
                    Vec::new()
                }
                Err(err) => return Err(err.into()),
            };
            if regions.is_empty() {
                continue;
            }
            let ids = regions
                .into_iter()
                .map(|region| (region.code.to_ascii_uppercase(), region.id))
                .collect();
            by_country.insert(country, ids);
        }
        Ok(by_country)
    }

    async fn submit(
        &self,
        bulk: &MagentoBulkCommand<G, J, C>,
        tenant_id: TenantId,
        method: BulkMethod,
        writes: &[(String, MagentoTaxRate)],
    ) -> TaxSyncResult<BulkCommandReport> {
        let payloads = writes
            .iter()
            .map(|(_, rate)| rate.bulk_payload())
            .collect::<Result<Vec<Value>, _>>()?;
        Ok(bulk
            .execute(tenant_id, TAX_RATE_TOPIC, method, &payloads)
            .await?)
    }

    async fn delete_orphans(
        &self,
        scope: &EntityMapScope,
        deletes: &[(String, MagentoTaxRate)],
        report: &mut TaxSyncReport,
    ) -> TaxSyncResult<()> {
        for (key, rate) in deletes {
            let Some(id) = rate.id else {
                warn!(key = %key, code = %rate.code, "orphaned Magento rate has no id");
                report.failed_deletes += 1;
                continue;
            };
            match self.magento.delete_tax_rate(id).await {
                Ok(()) | Err(MagentoError::NotFound(_)) => {
                    self.maps.remove(scope, key).await?;
                    report.deleted += 1;
                }
                Err(err) => {
                    warn!(key = %key, id, error = %err, "failed to delete orphaned tax rate");
                    report.failed_deletes += 1;
                }
            }
        }
        Ok(())
    }

    /// Re-reads Magento after the bulks and records mappings for every rate
    /// that now matches MOM, which also picks up identifiers of new rates.
    async fn confirm_writes(
        &self,
        scope: &EntityMapScope,
        plan: &SyncPlan,
        maps: &[ThirdPartyEntityMap],
        report: &mut TaxSyncReport,
    ) -> TaxSyncResult<()> {
        let recorded: HashMap<&str, &ThirdPartyEntityMap> =
            maps.iter().map(|map| (map.internal_key(), map)).collect();

        if !plan.creates.is_empty() || !plan.updates.is_empty() {
            let current: HashMap<String, MagentoTaxRate> = self
                .magento
                .list_tax_rates()
                .await?
                .into_iter()
                .map(|rate| (rate.code.clone(), rate))
                .collect();
            for (key, desired) in &plan.creates {
                if self.record_if_applied(scope, key, desired, &current).await? {
                    report.created += 1;
                }
            }
            for (key, desired) in &plan.updates {
                if self.record_if_applied(scope, key, desired, &current).await? {
                    report.updated += 1;
                }
            }
        }

        for (key, desired, external) in &plan.unchanged {
            let fingerprint = EntityFingerprint::of(desired)?;
            let up_to_date = recorded.get(key.as_str()).is_some_and(|map| {
                map.is_unchanged(&fingerprint)
                    && external.id.is_some_and(|id| map.external_id() == id.to_string())
            });
            if let (false, Some(id)) = (up_to_date, external.id) {
                self.record(scope, key, id, fingerprint).await?;
            }
        }
        Ok(())
    }

    async fn record_if_applied(
        &self,
        scope: &EntityMapScope,
        key: &str,
        desired: &MagentoTaxRate,
        current: &HashMap<String, MagentoTaxRate>,
    ) -> TaxSyncResult<bool> {
        let applied = current
            .get(&desired.code)
            .filter(|stored| desired.same_content(stored))
            .and_then(|stored| stored.id);
        let Some(id) = applied else {
            debug!(key = %key, code = %desired.code, "tax rate not applied by Magento");
            return Ok(false);
        };
        let fingerprint = EntityFingerprint::of(&desired.clone().with_id(None))?;
        self.record(scope, key, id, fingerprint).await?;
        Ok(true)
    }

    async fn record(
        &self,
        scope: &EntityMapScope,
        key: &str,
        external_id: u64,
        fingerprint: EntityFingerprint,
    ) -> TaxSyncResult<()> {
        let map = ThirdPartyEntityMap::new(
            scope.clone(),
            key,
            external_id.to_string(),
            Authority::Internal,
            fingerprint,
            &*self.clock,
        );
        self.maps.upsert(&map).await?;
        Ok(())
    }
}

/// Keys Magento rates by destination, stripping the managed prefix.
///
/// Rates whose code is not a managed key are keyed by their raw code under
/// a separate namespace so they never pair with a MOM rate.
fn key_magento_rates(rates: Vec<MagentoTaxRate>, prefix: &str) -> BTreeMap<String, MagentoTaxRate> {
    let mut keyed = BTreeMap::new();
    for rate in rates {
        let key = managed_key(&rate.code, prefix).map_or_else(
            || format!("{UNMANAGED_KEY_PREFIX}{}", rate.code),
            |managed| managed.to_string(),
        );
        if let Some(previous) = keyed.insert(key, rate) {
            warn!(code = %previous.code, "several Magento rates share a key; keeping the last");
        }
    }
    keyed
}

fn plan_writes(
    decisions: Vec<SyncDecision<MagentoTaxRate, MagentoTaxRate>>,
    report: &mut TaxSyncReport,
) -> SyncPlan {
    let mut plan = SyncPlan::default();
    for decision in decisions {
        debug!(key = %decision.key(), decision = decision_label(&decision), "tax rate decision");
        match decision {
            SyncDecision::Create { key, internal } => plan.creates.push((key, internal)),
            SyncDecision::Update {
                key,
                internal,
                external,
            } => plan.updates.push((key, internal.with_id(external.id))),
            SyncDecision::Delete { key, external } => plan.deletes.push((key, external)),
            SyncDecision::Skip {
                key,
                reason,
                internal,
                external,
            } => {
                report.record_skip(reason);
                if let (SkipReason::Unchanged, Some(desired), Some(stored)) =
                    (reason, internal, external)
                {
                    plan.unchanged.push((key, desired, stored));
                }
            }
        }
    }
    plan
}

const fn decision_label<I, E>(decision: &SyncDecision<I, E>) -> &'static str {
    match decision {
        SyncDecision::Create { .. } => "create",
        SyncDecision::Update { .. } => "update",
        SyncDecision::Delete { .. } => "delete",
        SyncDecision::Skip { reason, .. } => match reason {
            SkipReason::ExternallyOwned => "skip: externally owned",
            SkipReason::Unchanged => "skip: unchanged",
            SkipReason::OrphanRetained => "skip: orphan retained",
            SkipReason::Unmanaged => "skip: unmanaged",
        },
    }
}
