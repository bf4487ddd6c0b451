//! Tax-rate synchronization from MOM into Magento.
//!
//! MOM owns tax rates. [`services::TaxRateSyncCache`] keeps a TTL-bounded
//! snapshot of them for tax lookups, and [`services::TaxRateSyncService`]
//! reconciles that snapshot against Magento's tax rates through bulk
//! operations.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
