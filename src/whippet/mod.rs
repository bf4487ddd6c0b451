//! Whippet's own entities: tenants, applications, settings and jobs.
//!
//! Every integration run is scoped to a tenant. Applications describe the
//! external systems a tenant connects (Magento, MOM, Salesforce), settings
//! tune those integrations, and jobs record the progress of background
//! synchronization work. Persistence follows a query/command split:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
