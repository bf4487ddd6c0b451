//! Whippet integrations: multi-tenant synchronization between Whippet, MOM
//! and Magento.
//!
//! The crate keeps Magento's tax rates in line with the rates maintained in
//! MOM (Multichannel Order Manager), one tenant at a time, and records which
//! Magento record belongs to which MOM rate so repeated runs only write what
//! changed.
//!
//! # Architecture
//!
//! Every module follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces, split into queries and commands
//! - **Adapters**: In-memory, `PostgreSQL` and HTTP implementations of ports
//! - **Services**: Orchestration across ports
//!
//! # Modules
//!
//! - [`whippet`]: Tenants, applications, scoped settings and jobs
//! - [`third_party`]: Entity maps and skip-versus-delete reconciliation
//! - [`mom`]: MOM tax rates and their source
//! - [`magento`]: Magento tax rates, bulk operations and the REST client
//! - [`taxes`]: The tax-rate cache and synchronization service
//! - [`config`] and [`telemetry`]: Process setup for the binaries

pub mod clock;
pub mod config;
pub mod magento;
pub mod mom;
pub mod postgres;
pub mod taxes;
pub mod telemetry;
pub mod third_party;
pub mod whippet;
