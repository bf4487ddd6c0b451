//! MOM tax-rate source adapters.

pub mod memory;
pub mod postgres;
