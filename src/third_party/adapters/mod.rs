//! Entity-map repository adapters.

pub mod memory;
pub mod postgres;
