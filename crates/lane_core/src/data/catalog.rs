//! Name-indexed template catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{SkillStats, UnitStats};
use crate::error::{GameError, Result};

/// Every unit and skill template available to a battle.
///
/// # Example RON
///
/// ```ron
/// Catalog(
///     units: {
///         "grunt": (cost: 2, hp: 60, damage: 8, range: 30.0, attack_speed: 1.0, speed: 60.0),
///     },
///     skills: {
///         "fireball": (cost: 3, radius: 60.0, damage: 25),
///     },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Unit templates by name.
    #[serde(default)]
    pub units: BTreeMap<String, UnitStats>,
    /// Skill templates by name.
    #[serde(default)]
    pub skills: BTreeMap<String, SkillStats>,
}

impl Catalog {
    /// Parse a catalog from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the text does not parse.
    pub fn from_ron_str(source: &str, path: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::ron(path, &e))
    }

    /// Unit template by name.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&UnitStats> {
        self.units.get(name)
    }

    /// Skill template by name.
    #[must_use]
    pub fn skill(&self, name: &str) -> Option<&SkillStats> {
        self.skills.get(name)
    }

    /// Unit template by name, failing on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownTemplate`] if no unit has that name.
    pub fn require_unit(&self, name: &str) -> Result<&UnitStats> {
        self.unit(name)
            .ok_or_else(|| GameError::UnknownTemplate(name.to_string()))
    }

    /// Cost of a unit or skill by name.
    #[must_use]
    pub fn cost_of(&self, name: &str) -> Option<u32> {
        self.unit(name)
            .map(|u| u.cost)
            .or_else(|| self.skill(name).map(|s| s.cost))
    }

    /// Register a unit template, replacing any previous one.
    pub fn insert_unit(&mut self, name: impl Into<String>, stats: UnitStats) {
        self.units.insert(name.into(), stats);
    }

    /// Register a skill template, replacing any previous one.
    pub fn insert_skill(&mut self, name: impl Into<String>, stats: SkillStats) {
        self.skills.insert(name.into(), stats);
    }

    /// Validate internal consistency.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, unit) in &self.units {
            errors.extend(unit.validate(name));
        }
        for (name, skill) in &self.skills {
            errors.extend(skill.validate(name));
            if self.units.contains_key(name) {
                errors.push(format!("Name '{name}' is both a unit and a skill"));
            }
        }

        errors
    }
}
