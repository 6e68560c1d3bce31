//! Integration tests module
//!
//! End-to-end runs of the clustering pipeline over in-memory tables.

pub mod baseline_test;
pub mod error_scenarios;
pub mod pipeline_test;
