//! Magento REST integration: tax rates and asynchronous bulk operations.
//!
//! Magento processes `/async/bulk` submissions in the background. A
//! submission only returns a bulk UUID, so callers use
//! [`services::MagentoBulkCommand`] to split work into batches, track each
//! batch as a Whippet job and poll Magento until the batch settles.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
