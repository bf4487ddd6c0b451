//! Validation errors for MOM tax data.

use rust_decimal::Decimal;
use thiserror::Error;

/// A MOM tax record that cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MomDataError {
    /// Country codes are two ASCII letters.
    #[error("invalid country code: {0:?}")]
    InvalidCountry(String),

    /// Region codes are non-empty and contain no dash.
    #[error("invalid region code: {0:?}")]
    InvalidRegion(String),

    /// Rates are percentages between zero and one hundred.
    #[error("tax rate {0} is outside 0..=100")]
    RateOutOfRange(Decimal),

    /// The value is not a `{country}-{region}-{postcode}` key.
    #[error("malformed tax rate key: {0:?}")]
    MalformedKey(String),
}
