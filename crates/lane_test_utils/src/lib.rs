//! # Lane Test Utilities
//!
//! Shared testing utilities for the workspace:
//! - Determinism and forecast-purity harness
//! - Fixture catalogs, grids and battles
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
