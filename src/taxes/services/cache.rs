//! TTL-bounded cache of MOM tax rates.

use crate::mom::{
    domain::{MomTaxRate, TaxRateKey, WILDCARD_POSTCODE},
    ports::{MomResult, MomTaxRateSource},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Immutable view of the MOM rates loaded by one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxRateSnapshot {
    rates: Arc<BTreeMap<TaxRateKey, MomTaxRate>>,
    refreshed_at: DateTime<Utc>,
}

impl TaxRateSnapshot {
    fn new(loaded: Vec<MomTaxRate>, refreshed_at: DateTime<Utc>) -> Self {
        let mut rates = BTreeMap::new();
        for rate in loaded {
            if let Some(previous) = rates.insert(rate.key().clone(), rate) {
                warn!(key = %previous.key(), "duplicate MOM tax rate; keeping the later row");
            }
        }
        Self {
            rates: Arc::new(rates),
            refreshed_at,
        }
    }

    /// Returns the rates ordered by key.
    #[must_use]
    pub fn rates(&self) -> &BTreeMap<TaxRateKey, MomTaxRate> {
        &self.rates
    }

    /// Returns the rate for an exact key.
    #[must_use]
    pub fn get(&self, key: &TaxRateKey) -> Option<&MomTaxRate> {
        self.rates.get(key)
    }

    /// Returns when the snapshot was loaded.
    #[must_use]
    pub const fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    /// Returns the number of rates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns whether the snapshot holds no rates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Refresh-or-serve cache over a [`MomTaxRateSource`].
///
/// Readers share the current snapshot. When it is stale, the first caller to
/// take the write lock reloads it and later callers reuse that result. A
/// failed reload leaves the previous snapshot in place.
#[derive(Debug)]
pub struct TaxRateSyncCache<C: Clock> {
    snapshot: RwLock<Option<TaxRateSnapshot>>,
    ttl: Duration,
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync> TaxRateSyncCache<C> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<C>) -> Self {
        Self {
            snapshot: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Returns the default time to live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns whether the next [`snapshot`](Self::snapshot) call reloads.
    pub async fn is_stale(&self) -> bool {
        let guard = self.snapshot.read().await;
        self.is_expired(guard.as_ref(), self.ttl)
    }

    /// Returns when the cached snapshot was loaded, if there is one.
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .map(TaxRateSnapshot::refreshed_at)
    }

    /// Drops the cached snapshot so the next read reloads.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    /// Serves the cached snapshot, reloading it first when stale.
    ///
    /// # Errors
    ///
    /// Propagates the source error when a reload fails.
    pub async fn snapshot<S>(&self, source: &S) -> MomResult<TaxRateSnapshot>
    where
        S: MomTaxRateSource + ?Sized,
    {
        self.snapshot_with_ttl(source, self.ttl).await
    }

    /// Like [`snapshot`](Self::snapshot) with a caller-provided time to live.
    ///
    /// # Errors
    ///
    /// Propagates the source error when a reload fails.
    pub async fn snapshot_with_ttl<S>(
        &self,
        source: &S,
        ttl: Duration,
    ) -> MomResult<TaxRateSnapshot>
    where
        S: MomTaxRateSource + ?Sized,
    {
        {
            let guard = self.snapshot.read().await;
            if let Some(current) = guard
                .as_ref()
                .filter(|current| !self.is_expired(Some(current), ttl))
            {
                return Ok(current.clone());
            }
        }

        let mut guard = self.snapshot.write().await;
        if let Some(current) = guard
            .as_ref()
            .filter(|current| !self.is_expired(Some(current), ttl))
        {
            return Ok(current.clone());
        }
        let loaded = source.load_tax_rates().await?;
        let refreshed = TaxRateSnapshot::new(loaded, self.clock.utc());
        info!(
            rates = refreshed.len(),
            refreshed_at = %refreshed.refreshed_at(),
            "refreshed MOM tax rate cache"
        );
        *guard = Some(refreshed.clone());
        Ok(refreshed)
    }

    /// Looks up the rate for a destination.
    ///
    /// An exact postcode match wins; otherwise the region-wide rate applies.
    ///
    /// # Errors
    ///
    /// Returns an error when the destination is malformed or a reload fails.
    pub async fn rate_for<S>(
        &self,
        source: &S,
        country: &str,
        region: &str,
        postcode: &str,
    ) -> MomResult<Option<MomTaxRate>>
    where
        S: MomTaxRateSource + ?Sized,
    {
        let exact = TaxRateKey::new(country, region, postcode)?;
        let snapshot = self.snapshot(source).await?;
        if let Some(rate) = snapshot.get(&exact) {
            return Ok(Some(rate.clone()));
        }
        let region_wide = TaxRateKey::new(country, region, WILDCARD_POSTCODE)?;
        Ok(snapshot.get(&region_wide).cloned())
    }

    fn is_expired(&self, snapshot: Option<&TaxRateSnapshot>, ttl: Duration) -> bool {
        let Some(current) = snapshot else {
            return true;
        };
        if ttl.is_zero() {
            return true;
        }
        // A clock that moved backwards yields a negative age, which `to_std`
        // rejects; such snapshots count as fresh.
        (self.clock.utc() - current.refreshed_at)
            .to_std()
            .is_ok_and(|age| age >= ttl)
    }
}
