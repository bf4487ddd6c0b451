//! JSON shapes of Magento REST responses that do not map one-to-one onto
//! domain types.

use crate::magento::domain::{BulkOperation, MagentoTaxRate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{"taxRate": {...}}` request body.
#[derive(Debug, Serialize)]
pub(super) struct TaxRateEnvelope<'a> {
    #[serde(rename = "taxRate")]
    pub(super) tax_rate: &'a MagentoTaxRate,
}

/// Result page of a `searchCriteria` query.
#[derive(Debug, Deserialize)]
pub(super) struct SearchResults<T> {
    #[serde(default = "Vec::new")]
    pub(super) items: Vec<T>,
    #[serde(default)]
    pub(super) total_count: u64,
}

/// Response of `/V1/bulk/{uuid}/detailed-status`.
#[derive(Debug, Deserialize)]
pub(super) struct DetailedBulkStatus {
    pub(super) bulk_id: String,
    #[serde(default)]
    pub(super) operations_list: Vec<BulkOperation>,
}

/// Response of `/V1/directory/countries/{country}`.
#[derive(Debug, Deserialize)]
pub(super) struct CountryInfo {
    #[serde(default)]
    pub(super) available_regions: Option<Vec<RegionInfo>>,
}

/// Region entry; Magento encodes the identifier as a string.
#[derive(Debug, Deserialize)]
pub(super) struct RegionInfo {
    pub(super) id: String,
    pub(super) code: String,
    #[serde(default)]
    pub(super) name: String,
}

/// Error body with `%name` or `%1` placeholders.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub(super) message: String,
    #[serde(default)]
    pub(super) parameters: Option<Value>,
}

impl ErrorBody {
    /// Substitutes placeholders with their parameter values.
    pub(super) fn rendered(&self) -> String {
        let pairs: Vec<(String, String)> = match &self.parameters {
            Some(Value::Object(named)) => named
                .iter()
                .map(|(name, value)| (format!("%{name}"), display_value(value)))
                .collect(),
            Some(Value::Array(positional)) => positional
                .iter()
                .enumerate()
                .map(|(index, value)| (format!("%{}", index + 1), display_value(value)))
                .collect(),
            _ => Vec::new(),
        };
        pairs
            .iter()
            .rev()
            .fold(self.message.clone(), |message, (placeholder, value)| {
                message.replace(placeholder.as_str(), value)
            })
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
