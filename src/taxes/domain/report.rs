//! Outcome of a tax sync.

use crate::third_party::domain::SkipReason;
use crate::whippet::domain::JobId;
use std::collections::HashMap;
use std::fmt;

/// Counts of what a tax sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxSyncReport {
    /// Job tracking the sync.
    pub job_id: JobId,
    /// Rates MOM currently provides.
    pub source_rates: usize,
    /// Rates confirmed created in Magento.
    pub created: usize,
    /// Rates confirmed updated in Magento.
    pub updated: usize,
    /// Rates deleted from Magento.
    pub deleted: usize,
    /// Rates left untouched, by reason.
    pub skipped: HashMap<SkipReason, usize>,
    /// Bulk batches that failed or timed out.
    pub failed_batches: usize,
    /// Deletes Magento refused.
    pub failed_deletes: usize,
    /// Rates not written because Magento lists regions for their country
    /// but not theirs.
    pub unresolved_regions: usize,
}

impl TaxSyncReport {
    pub(crate) fn new(job_id: JobId, source_rates: usize) -> Self {
        Self {
            job_id,
            source_rates,
            created: 0,
            updated: 0,
            deleted: 0,
            skipped: HashMap::new(),
            failed_batches: 0,
            failed_deletes: 0,
            unresolved_regions: 0,
        }
    }

    /// Returns how many rates were skipped for `reason`.
    #[must_use]
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Returns whether every MOM rate and every write reached Magento.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed_batches == 0 && self.failed_deletes == 0 && self.unresolved_regions == 0
    }

    pub(crate) fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }
}

impl fmt::Display for TaxSyncReport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let skipped: usize = self.skipped.values().sum();
        write!(
            formatter,
            "{} source rates: {} created, {} updated, {} deleted, {skipped} skipped, \
             {} failed batches, {} failed deletes, {} unresolved regions",
            self.source_rates,
            self.created,
            self.updated,
            self.deleted,
            self.failed_batches,
            self.failed_deletes,
            self.unresolved_regions,
        )
    }
}
