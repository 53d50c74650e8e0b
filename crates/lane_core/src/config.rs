//! Tuning constants for the live battle loop.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, Fixed};

/// Live-loop tuning.
///
/// Every field has a default, so a RON file only needs to list overrides:
///
/// ```ron
/// BattleConfig(skill_delay: 0.25)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Minimum seconds between path requests per entity.
    #[serde(with = "fixed_decimal")]
    pub replan_interval: Fixed,
    /// A waypoint counts as reached within this distance.
    #[serde(with = "fixed_decimal")]
    pub waypoint_tolerance: Fixed,
    /// Personal-space radius for same-team separation.
    #[serde(with = "fixed_decimal")]
    pub separation_radius: Fixed,
    /// Separation push in units per second at full overlap.
    #[serde(with = "fixed_decimal")]
    pub separation_force: Fixed,
    /// Hits above this amount are reported as critical.
    pub crit_threshold: i32,
    /// Seconds between a skill plan firing and its impact.
    #[serde(with = "fixed_decimal")]
    pub skill_delay: Fixed,
    /// Knockback displacement in world units.
    #[serde(with = "fixed_decimal")]
    pub knockback_distance: Fixed,
    /// Cooldown applied when crowd control interrupts a cast.
    #[serde(with = "fixed_decimal")]
    pub cast_cancel_penalty: Fixed,
    /// Node expansions per entity per frame for bounded path searches.
    pub path_nodes_per_frame: u32,
    /// Seconds a fresh deployment stays untargetable.
    #[serde(with = "fixed_decimal")]
    pub spawn_grace: Fixed,
    /// Maximum hook commands processed per combat action.
    pub max_hook_commands: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            replan_interval: Fixed::from_num(0.5),
            waypoint_tolerance: Fixed::from_num(20),
            separation_radius: Fixed::from_num(30),
            separation_force: Fixed::from_num(200),
            crit_threshold: 30,
            skill_delay: Fixed::from_num(0.4),
            knockback_distance: Fixed::from_num(50),
            cast_cancel_penalty: Fixed::from_num(0.5),
            path_nodes_per_frame: 64,
            spawn_grace: Fixed::ZERO,
            max_hook_commands: 64,
        }
    }
}

impl BattleConfig {
    /// Parse a config from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the text does not parse.
    pub fn from_ron_str(source: &str, path: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::ron(path, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config = BattleConfig::from_ron_str("(skill_delay: 0.25)", "battle.ron").unwrap();
        assert_eq!(config.skill_delay, Fixed::from_num(0.25));
        assert_eq!(config.crit_threshold, 30);
        assert_eq!(config.replan_interval, BattleConfig::default().replan_interval);
    }
}
