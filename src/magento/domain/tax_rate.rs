//! Magento tax-rate records.

use crate::mom::domain::{MomTaxRate, TaxRateKey, WILDCARD_POSTCODE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bulk topic for tax-rate writes (`/async/bulk/V1/taxRates`).
pub const TAX_RATE_TOPIC: &str = "taxRates";

/// A tax rate as exposed by `/V1/taxRates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagentoTaxRate {
    /// Magento identifier; absent until the rate is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// ISO country code.
    pub tax_country_id: String,
    /// Directory region identifier. `0` or absent applies to every region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_region_id: Option<u64>,
    /// Region code reported by Magento.
    #[serde(rename = "region_name", default, skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    /// Postcode pattern, `*` for all postcodes.
    #[serde(default = "wildcard_postcode")]
    pub tax_postcode: String,
    /// Unique rate code.
    pub code: String,
    /// Percentage rate.
    pub rate: Decimal,
}

fn wildcard_postcode() -> String {
    WILDCARD_POSTCODE.to_owned()
}

impl MagentoTaxRate {
    /// Builds the Magento representation of a MOM rate.
    ///
    /// The code is `{managed_prefix}{country}-{region}-{postcode}`, which lets
    /// later syncs recognize rates Whippet created.
    #[must_use]
    pub fn from_mom(rate: &MomTaxRate, managed_prefix: &str) -> Self {
        let key = rate.key();
        Self {
            id: None,
            tax_country_id: key.country().to_owned(),
            tax_region_id: None,
            region_code: Some(key.region().to_owned()),
            tax_postcode: key.postcode().to_owned(),
            code: format!("{managed_prefix}{key}"),
            rate: rate.rate(),
        }
    }

    /// Sets the directory region identifier.
    #[must_use]
    pub const fn with_region_id(mut self, region_id: Option<u64>) -> Self {
        self.tax_region_id = region_id;
        self
    }

    /// Sets the Magento identifier.
    #[must_use]
    pub const fn with_id(mut self, id: Option<u64>) -> Self {
        self.id = id;
        self
    }

    /// Wraps the rate as a `{"taxRate": ..}` bulk payload.
    ///
    /// # Errors
    ///
    /// Returns the serialization error when the rate cannot be encoded.
    pub fn bulk_payload(&self) -> Result<Value, serde_json::Error> {
        let mut envelope = Map::new();
        envelope.insert("taxRate".to_owned(), serde_json::to_value(self)?);
        Ok(Value::Object(envelope))
    }

    /// Returns whether the fields Whippet manages match `other`.
    ///
    /// Identifiers are ignored and rates compare numerically, so `7.25` and
    /// `7.2500` are equal.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.tax_country_id == other.tax_country_id
            && self.tax_region_id.unwrap_or(0) == other.tax_region_id.unwrap_or(0)
            && self.tax_postcode == other.tax_postcode
            && self.code == other.code
            && self.rate == other.rate
    }
}

/// Parses the destination key out of a managed rate code.
///
/// Returns `None` for codes without the prefix or whose remainder is not a
/// `{country}-{region}-{postcode}` key.
#[must_use]
pub fn managed_key(code: &str, managed_prefix: &str) -> Option<TaxRateKey> {
    code.strip_prefix(managed_prefix)?.parse().ok()
}

/// A directory region from `/V1/directory/countries/{country}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagentoRegion {
    /// Region identifier used by `tax_region_id`.
    pub id: u64,
    /// Region code, such as `CA`.
    pub code: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}
