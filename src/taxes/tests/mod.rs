//! Unit tests for tax-rate caching and synchronization.

mod cache_tests;
