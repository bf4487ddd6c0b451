//! Errors shared by Whippet repository ports.

use std::sync::Arc;
use thiserror::Error;

/// Result type for Whippet repository operations.
pub type WhippetRepositoryResult<T> = Result<T, WhippetRepositoryError>;

/// Errors returned by Whippet repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WhippetRepositoryError {
    /// A record with the same identity or unique key already exists.
    #[error("duplicate {entity}: {key}")]
    Duplicate {
        /// Entity name.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },

    /// The record to update does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Missing key.
        key: String,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WhippetRepositoryError {
    /// Creates a duplicate-record error.
    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        Self::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
