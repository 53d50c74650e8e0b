//! Data structures for unit and skill templates.
//!
//! All structs are designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `lane_tools`.

mod catalog;
mod skill_data;
mod unit_data;

pub use catalog::Catalog;
pub use skill_data::SkillStats;
pub use unit_data::{Trait, UnitStats};
