//! In-memory Whippet repositories for tests and local runs.

mod application;
mod job;
mod setting;
mod tenant;

pub use application::InMemoryApplicationRepository;
pub use job::InMemoryJobRepository;
pub use setting::InMemorySettingRepository;
pub use tenant::InMemoryTenantRepository;

use crate::whippet::ports::WhippetRepositoryError;

/// Maps a poisoned lock into a persistence error.
fn lock_error(err: impl ToString) -> WhippetRepositoryError {
    WhippetRepositoryError::persistence(std::io::Error::other(err.to_string()))
}
