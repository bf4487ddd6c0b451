//! Unit tests for the Whippet entity module.

mod domain_tests;
