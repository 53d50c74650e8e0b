//! Area skill templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Team;
use crate::math::{fixed_decimal, fixed_decimal_map, option_fixed_decimal, Fixed};
use crate::status::CcKind;

/// Immutable stat template for one skill name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillStats {
    /// Deployment cost.
    pub cost: u32,

    /// Impact radius in world units.
    #[serde(with = "fixed_decimal")]
    pub radius: Fixed,

    /// Damage dealt to each target.
    #[serde(default)]
    pub damage: i32,

    /// Shield granted, applied as an instant heal.
    #[serde(default)]
    pub shield: i32,

    /// Single stun duration in seconds.
    #[serde(with = "option_fixed_decimal", default)]
    pub stun: Option<Fixed>,

    /// Additional crowd control, kind to duration in seconds.
    #[serde(with = "fixed_decimal_map", default)]
    pub cc: BTreeMap<CcKind, Fixed>,

    /// Affects both teams.
    #[serde(default)]
    pub friendly_fire: bool,
}

impl SkillStats {
    /// Pure support skills (shield, no damage) land on the caster's side;
    /// everything else lands on the opposing side.
    #[must_use]
    pub fn affected_team(&self, caster: Team) -> Team {
        if self.damage <= 0 && self.shield > 0 {
            caster
        } else {
            caster.opponent()
        }
    }

    /// Problems with this template, empty when valid.
    #[must_use]
    pub fn validate(&self, name: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if self.radius <= Fixed::ZERO {
            errors.push(format!("Skill '{name}' has non-positive radius"));
        }
        if self.damage < 0 || self.shield < 0 {
            errors.push(format!("Skill '{name}' has negative damage or shield"));
        }
        if self.stun.is_some_and(|s| s <= Fixed::ZERO)
            || self.cc.values().any(|d| *d <= Fixed::ZERO)
        {
            errors.push(format!("Skill '{name}' has a non-positive CC duration"));
        }
        errors
    }
}
