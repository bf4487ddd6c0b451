//! Unit tests for third-party entity mapping.

mod entity_map_tests;
