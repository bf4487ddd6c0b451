//! Magento adapters: the REST client and an in-memory fake.

pub mod http;
pub mod memory;
