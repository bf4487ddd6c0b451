//! Errors reported by Magento adapters.

use thiserror::Error;

/// Result type for Magento calls.
pub type MagentoResult<T> = Result<T, MagentoError>;

/// Failures talking to Magento.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MagentoError {
    /// Magento answered with a non-success status.
    #[error("Magento returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Magento's `message` field, or the raw body.
        message: String,
    },

    /// The request never produced a response.
    #[error("Magento transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("failed to decode Magento response: {0}")]
    Decode(String),

    /// The addressed resource does not exist.
    #[error("Magento resource not found: {0}")]
    NotFound(String),

    /// The access token was rejected.
    #[error("Magento rejected the access token")]
    Unauthorized,

    /// The client could not be constructed.
    #[error("invalid Magento client configuration: {0}")]
    Configuration(String),
}
