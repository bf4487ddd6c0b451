//! Tax rates keyed by destination.

use super::MomDataError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Postcode used for rates that apply to a whole region.
pub const WILDCARD_POSTCODE: &str = "*";

const RATE_SCALE: u32 = 4;

/// Destination identity shared by MOM and Magento:
/// `{country}-{region}-{postcode}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxRateKey {
    country: String,
    region: String,
    postcode: String,
}

impl TaxRateKey {
    /// Builds a normalized key.
    ///
    /// Country and region are uppercased. A blank postcode becomes the
    /// region-wide wildcard.
    ///
    /// # Errors
    ///
    /// Returns [`MomDataError`] when the country is not two ASCII letters or
    /// the region is blank or contains a dash.
    pub fn new(country: &str, region: &str, postcode: &str) -> Result<Self, MomDataError> {
        let country_code = country.trim().to_ascii_uppercase();
        if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MomDataError::InvalidCountry(country.to_owned()));
        }
        let region_code = region.trim().to_ascii_uppercase();
        if region_code.is_empty() || region_code.contains('-') {
            return Err(MomDataError::InvalidRegion(region.to_owned()));
        }
        let trimmed_postcode = postcode.trim();
        let normalized_postcode = if trimmed_postcode.is_empty() {
            WILDCARD_POSTCODE.to_owned()
        } else {
            trimmed_postcode.to_ascii_uppercase()
        };
        Ok(Self {
            country: country_code,
            region: region_code,
            postcode: normalized_postcode,
        })
    }

    /// Returns the ISO country code.
    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Returns the region code.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the postcode, or `*` for region-wide rates.
    #[must_use]
    pub fn postcode(&self) -> &str {
        &self.postcode
    }
}

impl fmt::Display for TaxRateKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}-{}-{}", self.country, self.region, self.postcode)
    }
}

impl FromStr for TaxRateKey {
    type Err = MomDataError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(country), Some(region), Some(postcode)) if !postcode.trim().is_empty() => {
                Self::new(country, region, postcode)
                    .map_err(|_| MomDataError::MalformedKey(value.to_owned()))
            }
            _ => Err(MomDataError::MalformedKey(value.to_owned())),
        }
    }
}

/// Effective tax rate MOM applies to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomTaxRate {
    key: TaxRateKey,
    county: Option<String>,
    rate: Decimal,
}

impl MomTaxRate {
    /// Creates a validated rate, rounded to four decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`MomDataError`] when the destination is invalid or the rate
    /// falls outside `0..=100`.
    pub fn new(
        country: &str,
        region: &str,
        postcode: &str,
        county: Option<String>,
        rate: Decimal,
    ) -> Result<Self, MomDataError> {
        let key = TaxRateKey::new(country, region, postcode)?;
        if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
            return Err(MomDataError::RateOutOfRange(rate));
        }
        Ok(Self {
            key,
            county: county
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
            rate: rate.round_dp(RATE_SCALE),
        })
    }

    /// Returns the destination key.
    #[must_use]
    pub const fn key(&self) -> &TaxRateKey {
        &self.key
    }

    /// Returns the county name, when MOM tracks one.
    #[must_use]
    pub fn county(&self) -> Option<&str> {
        self.county.as_deref()
    }

    /// Returns the percentage rate.
    #[must_use]
    pub const fn rate(&self) -> Decimal {
        self.rate
    }
}
