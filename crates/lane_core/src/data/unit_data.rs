//! Unit templates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal, option_fixed_decimal, Fixed};

/// Tag carried by a unit template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Trait {
    /// May deploy onto neutral ground.
    Infiltrator,
    /// Spawns hidden from hostile targeting.
    Stealth,
    /// Static structure; the AI treats it like a tank.
    Structure,
    /// Frontline unit; the AI sends it to the busiest lane.
    Tank,
    /// Team base: never moves or acts.
    Base,
}

fn default_projectile_speed() -> Fixed {
    Fixed::from_num(300)
}

/// Immutable stat template for one unit name.
///
/// # Example RON
///
/// ```ron
/// UnitStats(
///     cost: 3,
///     hp: 120,
///     damage: 12,
///     range: 40.0,
///     attack_speed: 1.0,
///     speed: 60.0,
///     projectile: false,
///     traits: [Tank],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Deployment cost.
    pub cost: u32,

    /// Maximum hit points.
    pub hp: i32,

    /// Damage per attack. Negative values heal.
    pub damage: i32,

    /// Attack range in world units.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,

    /// Cooldown between attacks in seconds.
    #[serde(with = "fixed_decimal")]
    pub attack_speed: Fixed,

    /// Movement speed in world units per second.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,

    /// Ranged attacks travel as projectiles.
    #[serde(default)]
    pub projectile: bool,

    /// Projectile flight speed in world units per second.
    #[serde(with = "fixed_decimal", default = "default_projectile_speed")]
    pub projectile_speed: Fixed,

    /// Trait tags.
    #[serde(default)]
    pub traits: BTreeSet<Trait>,

    /// Wind-up before an attack fires, in seconds.
    #[serde(with = "option_fixed_decimal", default)]
    pub cast_time: Option<Fixed>,

    /// Units spawned per deployment.
    #[serde(default)]
    pub spawn_count: Option<u32>,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            cost: 0,
            hp: 1,
            damage: 0,
            range: Fixed::ZERO,
            attack_speed: Fixed::ONE,
            speed: Fixed::ZERO,
            projectile: false,
            projectile_speed: default_projectile_speed(),
            traits: BTreeSet::new(),
            cast_time: None,
            spawn_count: None,
        }
    }
}

impl UnitStats {
    /// Returns true if the template carries `tag`.
    #[must_use]
    pub fn has_trait(&self, tag: Trait) -> bool {
        self.traits.contains(&tag)
    }

    /// Cast time, zero when absent.
    #[must_use]
    pub fn cast_time(&self) -> Fixed {
        self.cast_time.unwrap_or(Fixed::ZERO)
    }

    /// Units spawned per deployment, at least one.
    #[must_use]
    pub fn spawn_count(&self) -> u32 {
        self.spawn_count.unwrap_or(1).max(1)
    }

    /// Problems with this template, empty when valid.
    #[must_use]
    pub fn validate(&self, name: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if self.hp <= 0 {
            errors.push(format!("Unit '{name}' has non-positive hp {}", self.hp));
        }
        if self.range < Fixed::ZERO {
            errors.push(format!("Unit '{name}' has negative range"));
        }
        if self.speed < Fixed::ZERO {
            errors.push(format!("Unit '{name}' has negative speed"));
        }
        if self.attack_speed <= Fixed::ZERO && !self.has_trait(Trait::Base) {
            errors.push(format!("Unit '{name}' has non-positive attack speed"));
        }
        if self.projectile && self.projectile_speed <= Fixed::ZERO {
            errors.push(format!("Unit '{name}' fires projectiles with no speed"));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_ron() {
        let source = "(cost: 4, hp: 70, damage: -10, range: 40.0, attack_speed: 1.5, speed: 50.0)";
        let stats: UnitStats = ron::from_str(source).unwrap();

        assert_eq!(stats.cost, 4);
        assert_eq!(stats.damage, -10);
        assert_eq!(stats.attack_speed, Fixed::from_num(1.5));
        assert_eq!(stats.projectile_speed, Fixed::from_num(300));
        assert_eq!(stats.cast_time(), Fixed::ZERO);
        assert_eq!(stats.spawn_count(), 1);
        assert!(stats.validate("medic").is_empty());
    }

    #[test]
    fn test_parse_traits_and_options() {
        let source = "(cost: 2, hp: 30, damage: 5, range: 20.0, attack_speed: 1.0, speed: 80.0, \
                      traits: [Infiltrator, Stealth], cast_time: Some(0.5), spawn_count: Some(3))";
        let stats: UnitStats = ron::from_str(source).unwrap();

        assert!(stats.has_trait(Trait::Infiltrator));
        assert!(stats.has_trait(Trait::Stealth));
        assert!(!stats.has_trait(Trait::Tank));
        assert_eq!(stats.cast_time(), Fixed::from_num(0.5));
        assert_eq!(stats.spawn_count(), 3);
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let stats = UnitStats {
            hp: 0,
            ..UnitStats::default()
        };
        assert_eq!(stats.validate("ghost").len(), 1);
    }
}
