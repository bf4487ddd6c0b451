//! Error types for Whippet domain validation and parsing.

use super::JobStatus;
use thiserror::Error;

/// Errors returned while constructing or mutating Whippet domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WhippetDomainError {
    /// The tenant code is not a valid slug.
    #[error("invalid tenant code '{0}', expected lowercase letters, digits and dashes")]
    InvalidTenantCode(String),

    /// A display name is empty after trimming.
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    /// The tenant is already active.
    #[error("tenant is already active")]
    AlreadyActive,

    /// The tenant is already inactive.
    #[error("tenant is already inactive")]
    AlreadyInactive,

    /// The application base URL is missing or malformed.
    #[error("invalid application base url '{0}'")]
    InvalidBaseUrl(String),

    /// The setting key does not follow the dotted key format.
    #[error("invalid setting key '{0}'")]
    InvalidSettingKey(String),

    /// A setting value could not be interpreted as the requested type.
    #[error("setting '{key}' has invalid value '{value}', expected {expected}")]
    InvalidSettingValue {
        /// Setting key.
        key: String,
        /// Raw stored value.
        value: String,
        /// Human-readable expected type.
        expected: &'static str,
    },

    /// A job lifecycle transition is not permitted.
    #[error("invalid job transition from {from} to {to}")]
    InvalidJobTransition {
        /// State before the attempted transition.
        from: JobStatus,
        /// Requested target state.
        to: JobStatus,
    },
}

/// Error returned while parsing persisted enum values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseWhippetEnumError {
    /// Enum being parsed.
    pub kind: &'static str,
    /// Raw persisted value.
    pub value: String,
}

impl ParseWhippetEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
