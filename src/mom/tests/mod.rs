//! Unit tests for MOM tax data.

mod tax_rate_tests;
