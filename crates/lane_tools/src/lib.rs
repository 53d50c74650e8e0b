//! # Lane Development Tools
//!
//! Command-line tools for development:
//! - Data validators
//! - Scenario forecasts
//! - Headless AI-vs-script rounds

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod report;
pub mod scenario;
pub mod validate;
