//! Domain model for Whippet's own entities.
//!
//! Tenants own applications (the external systems being integrated),
//! settings that tune integrations per tenant or per application, and jobs
//! that track background synchronization work.

mod application;
mod error;
mod ids;
mod job;
mod setting;
mod tenant;

pub use application::{Application, ApplicationKind, PersistedApplicationData};
pub use error::{ParseWhippetEnumError, WhippetDomainError};
pub use ids::{ApplicationId, JobId, SettingId, TenantCode, TenantId};
pub use job::{Job, JobKind, JobStatus, PersistedJobData};
pub use setting::{PersistedSettingData, Setting, SettingKey};
pub use tenant::{PersistedTenantData, Tenant};
