//! Ports for the Magento REST surface Whippet depends on.

mod error;

pub use error::{MagentoError, MagentoResult};

use crate::magento::domain::{BulkAccepted, BulkRequest, BulkSummary, MagentoRegion, MagentoTaxRate};
use async_trait::async_trait;

/// Synchronous tax-rate endpoints.
#[async_trait]
pub trait MagentoTaxRateGateway: Send + Sync {
    /// Lists every tax rate, following pagination to the last page.
    async fn list_tax_rates(&self) -> MagentoResult<Vec<MagentoTaxRate>>;

    /// Creates a tax rate and returns it with its assigned identifier.
    async fn create_tax_rate(&self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate>;

    /// Replaces the tax rate identified by `rate.id`.
    async fn update_tax_rate(&self, rate: &MagentoTaxRate) -> MagentoResult<MagentoTaxRate>;

    /// Deletes a tax rate.
    async fn delete_tax_rate(&self, id: u64) -> MagentoResult<()>;

    /// Lists the directory regions of a country.
    async fn list_regions(&self, country: &str) -> MagentoResult<Vec<MagentoRegion>>;
}

/// Asynchronous bulk endpoints.
#[async_trait]
pub trait MagentoBulkSupport: Send + Sync {
    /// Submits a bulk request for background processing.
    async fn submit_bulk(&self, request: &BulkRequest) -> MagentoResult<BulkAccepted>;

    /// Fetches the detailed status of a submitted bulk.
    async fn bulk_status(&self, bulk_uuid: &str) -> MagentoResult<BulkSummary>;
}
