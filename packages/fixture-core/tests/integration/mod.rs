//! Integration test suite.
//!
//! Tests are organized by area:
//! 1. Relationship edge cases (global fixtures, mandatory inverses, dual relations)
//! 2. Deferred flush scopes
//! 3. Factories and repositories

pub mod deferred_flush_tests;
pub mod edge_case_relationship_tests;
pub mod factory_tests;
pub mod helpers;
