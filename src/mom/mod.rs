//! Read access to tax rates maintained in MOM (Multichannel Order Manager).
//!
//! MOM is the source of truth for tax rates. Whippet reads them through the
//! [`ports::MomTaxRateSource`] port and never writes back.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
