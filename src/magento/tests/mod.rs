//! Unit tests for the Magento integration.
