//! Magento domain types shared by adapters and services.

mod bulk;
mod tax_rate;

pub use bulk::{
    BulkAccepted, BulkMethod, BulkOperation, BulkOperationStatus, BulkRequest, BulkRequestItem,
    BulkState, BulkSummary, UnknownBulkStatus,
};
pub use tax_rate::{MagentoRegion, MagentoTaxRate, TAX_RATE_TOPIC, managed_key};
