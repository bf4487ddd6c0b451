//! Port contracts for Whippet entity persistence.
//!
//! Each entity exposes a read-only `*Queries` trait and a mutating
//! `*Commands` trait so callers depend only on the side they use.

mod application;
mod error;
mod job;
mod setting;
mod tenant;

pub use application::{ApplicationCommands, ApplicationQueries};
pub use error::{WhippetRepositoryError, WhippetRepositoryResult};
pub use job::{JobCommands, JobQueries};
pub use setting::{SettingCommands, SettingQueries};
pub use tenant::{TenantCommands, TenantQueries};
