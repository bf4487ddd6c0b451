//! Port for reading MOM tax rates.

use crate::mom::domain::{MomDataError, MomTaxRate};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for MOM reads.
pub type MomResult<T> = Result<T, MomError>;

/// Failures reading from MOM.
#[derive(Debug, Clone, Error)]
pub enum MomError {
    /// A row could not be turned into a valid tax rate.
    #[error("invalid MOM data: {0}")]
    InvalidData(#[from] MomDataError),

    /// The MOM store could not be read.
    #[error("MOM access error: {0}")]
    Access(Arc<dyn std::error::Error + Send + Sync>),
}

impl MomError {
    /// Wraps a storage-layer failure.
    pub fn access(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Access(Arc::new(err))
    }
}

/// Source of the tax rates MOM currently applies.
#[async_trait]
pub trait MomTaxRateSource: Send + Sync {
    /// Loads every active tax rate.
    async fn load_tax_rates(&self) -> MomResult<Vec<MomTaxRate>>;
}
