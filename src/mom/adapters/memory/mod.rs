//! Fixed in-memory MOM tax-rate source.

use crate::mom::{
    domain::MomTaxRate,
    ports::{MomError, MomResult, MomTaxRateSource},
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// In-memory tax-rate source whose contents can be replaced at runtime.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMomTaxRates {
    rates: Arc<RwLock<Vec<MomTaxRate>>>,
}

impl InMemoryMomTaxRates {
    /// Creates a source serving `rates`.
    #[must_use]
    pub fn new(rates: Vec<MomTaxRate>) -> Self {
        Self {
            rates: Arc::new(RwLock::new(rates)),
        }
    }

    /// Replaces the served rates.
    ///
    /// # Errors
    ///
    /// Returns [`MomError::Access`] when the lock is poisoned.
    pub fn replace(&self, rates: Vec<MomTaxRate>) -> MomResult<()> {
        let mut guard = self.rates.write().map_err(lock_error)?;
        *guard = rates;
        Ok(())
    }
}

fn lock_error(err: impl ToString) -> MomError {
    MomError::access(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl MomTaxRateSource for InMemoryMomTaxRates {
    async fn load_tax_rates(&self) -> MomResult<Vec<MomTaxRate>> {
        let guard = self.rates.read().map_err(lock_error)?;
        Ok(guard.clone())
    }
}
