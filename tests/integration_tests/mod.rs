//! Integration tests module
//!
//! End-to-end tests for the serptrend system, including:
//! - Fetch, store and score pipeline against a mock provider
//! - Provider error handling

pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
