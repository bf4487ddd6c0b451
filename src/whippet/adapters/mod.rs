//! Adapter implementations for Whippet repository ports.

pub mod memory;
pub mod postgres;
