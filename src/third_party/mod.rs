//! Mapping between Whippet records and their copies in external systems.
//!
//! An entity map remembers which third-party identifier a record was given,
//! who owns it and what it looked like when last synchronized. The
//! [`domain::reconcile`] decision table uses those maps to choose between
//! creating, updating, deleting or skipping each record.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
