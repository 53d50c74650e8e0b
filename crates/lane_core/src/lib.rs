//! # Lane Core
//!
//! Deterministic simulation core for a lane-based tactics battler.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No wall clock (callers pass time in)
//! - Seeded randomness only
//! - Fixed-point math for every simulation quantity
//!
//! The same rule set drives two simulations:
//! - [`battle`] - the live, authoritative loop with projectiles, crowd
//!   control, knockback and combat hooks
//! - [`forecast`] - a disposable clone-and-advance run that the opponent
//!   [`ai`] reads before it plans a round
//!
//! ## Crate Structure
//!
//! - [`grid`] / [`pathfinding`] - walkability grid and A*
//! - [`entity`] / [`status`] / [`data`] - records, effects and templates
//! - [`targeting`] / [`casting`] - per-tick unit behaviour
//! - [`rules`] - resolution shared by the live loop and the forecast
//! - [`combat`] - damage, death, skills and hooks
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod battle;
pub mod casting;
pub mod combat;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod forecast;
pub mod grid;
pub mod math;
pub mod pathfinding;
pub mod plan;
pub mod rules;
pub mod status;
pub mod targeting;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiConfig, Archetype, EnemyAi};
    pub use crate::battle::{Battle, BattleOutcome, GameSpeed, TickReport};
    pub use crate::combat::{CombatEvent, CombatHooks, HookCommand, NoHooks};
    pub use crate::config::BattleConfig;
    pub use crate::data::{Catalog, SkillStats, Trait, UnitStats};
    pub use crate::entity::{Entity, EntityId, Roster, Team};
    pub use crate::error::{GameError, Result};
    pub use crate::forecast::{run_forecast, Forecast, ForecastConfig, ForecastThrottle, Ghost};
    pub use crate::grid::{BattleGrid, TileKind};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::plan::{DeploymentPlan, PlanKind};
    pub use crate::status::{CcKind, CcRuleTable};
}
