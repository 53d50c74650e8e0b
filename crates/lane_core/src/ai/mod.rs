//! Opponent AI.
//!
//! The AI reads one forecast of the upcoming round, summarizes it into lane
//! densities and clusters ([`analysis`]), then greedily spends a cost budget
//! on skills and unit placements chosen by its [`Archetype`]. All randomness
//! comes from a seeded ChaCha stream, so a fixed seed and forecast reproduce
//! the same plan list.

pub mod analysis;
mod planner;
mod strategy;

pub use analysis::{analyze, lane_bounds, lane_of, Cluster, ClusterParams, LaneAnalysis, LANE_COUNT};
pub use planner::{AiConfig, EnemyAi};
pub use strategy::Archetype;
