//! Tax-rate domain types as maintained in MOM.

mod error;
mod tax_rate;

pub use error::MomDataError;
pub use tax_rate::{MomTaxRate, TaxRateKey, WILDCARD_POSTCODE};
