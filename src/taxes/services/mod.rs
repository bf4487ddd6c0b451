//! Tax-rate cache and synchronization services.

mod cache;
mod sync;

pub use cache::{TaxRateSnapshot, TaxRateSyncCache};
pub use sync::{TAX_RATE_ENTITY, TaxRateSyncService, TaxSyncError, TaxSyncResult};
