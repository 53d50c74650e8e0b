//! Scenario files: a grid, bases and scripted plans.
//!
//! ```ron
//! Scenario(
//!     tile_size: 20.0,
//!     rows: [
//!         "2200000033",
//!         "2201100033",
//!     ],
//!     bases: [(team: Ally, name: "keep", x: 20.0, y: 20.0)],
//!     ally_plans: [(kind: Unit, name: "soldier", x: 60.0, y: 20.0, time: 0.5)],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use lane_core::battle::Battle;
use lane_core::entity::Team;
use lane_core::error::GameError;
use lane_core::grid::BattleGrid;
use lane_core::math::{fixed_decimal, Fixed, Vec2Fixed};
use lane_core::plan::DeploymentPlan;

use crate::error::{read_to_string, Result};
use crate::validate::DataSet;

/// A base placed before the round starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSpec {
    /// Owning side.
    pub team: Team,
    /// Catalog unit name.
    pub name: String,
    /// X position.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Y position.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
}

fn default_tile_size() -> Fixed {
    Fixed::from_num(20)
}

/// A reproducible battle setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// World units per tile.
    #[serde(with = "fixed_decimal", default = "default_tile_size")]
    pub tile_size: Fixed,
    /// One string per grid row, one digit per tile.
    pub rows: Vec<String>,
    /// Bases to place.
    #[serde(default)]
    pub bases: Vec<BaseSpec>,
    /// Player deployments.
    #[serde(default)]
    pub ally_plans: Vec<DeploymentPlan>,
    /// Scripted opponent deployments, used when no AI plans the round.
    #[serde(default)]
    pub enemy_plans: Vec<DeploymentPlan>,
}

impl Scenario {
    /// Parse a scenario from RON source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is malformed.
    pub fn from_ron_str(source: &str, path: &str) -> Result<Self> {
        ron::from_str(source)
            .map_err(|e| GameError::DataParseError {
                path: path.to_string(),
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_ron_str(&read_to_string(path)?, &path.display().to_string())
    }

    /// Build the grid from the row strings.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidGrid`] on non-digit cells or ragged rows.
    pub fn grid(&self) -> Result<BattleGrid> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for (y, row) in self.rows.iter().enumerate() {
            let cells = row
                .chars()
                .map(|c| {
                    c.to_digit(10)
                        .and_then(|d| u8::try_from(d).ok())
                        .ok_or_else(|| GameError::InvalidGrid(format!("Row {y} has non-digit cell '{c}'")))
                })
                .collect::<std::result::Result<Vec<u8>, GameError>>()?;
            rows.push(cells);
        }
        Ok(BattleGrid::from_rows(&rows, self.tile_size)?)
    }

    /// Build a ready-to-run battle with bases placed and plans loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is invalid or a base names an unknown unit.
    pub fn build_battle(&self, data: &DataSet) -> Result<Battle> {
        let mut battle = Battle::new(
            self.grid()?,
            data.catalog.clone(),
            data.cc_rules.clone(),
            data.battle.clone(),
        );
        for base in &self.bases {
            battle.place_base(&base.name, base.team, Vec2Fixed::new(base.x, base.y))?;
        }
        battle.add_plans(Team::Ally, self.ally_plans.iter().cloned());
        battle.add_plans(Team::Enemy, self.enemy_plans.iter().cloned());
        Ok(battle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_core::ai::AiConfig;
    use lane_core::config::BattleConfig;
    use lane_core::grid::TileKind;
    use lane_core::status::CcRuleTable;

    const SOURCE: &str = r#"Scenario(
        rows: [
            "22000033",
            "22010033",
            "22000033",
        ],
        bases: [
            (team: Ally, name: "keep", x: 10.0, y: 30.0),
            (team: Enemy, name: "keep", x: 150.0, y: 30.0),
        ],
        ally_plans: [(kind: Unit, name: "soldier", x: 30.0, y: 10.0, time: 0.5)],
    )"#;

    fn data() -> DataSet {
        DataSet {
            catalog: lane_test_utils::fixtures::catalog(),
            cc_rules: CcRuleTable::default(),
            battle: BattleConfig::default(),
            ai: AiConfig::default(),
        }
    }

    #[test]
    fn test_parse_and_build() {
        let scenario = Scenario::from_ron_str(SOURCE, "test.ron").unwrap();
        assert_eq!(scenario.tile_size, Fixed::from_num(20));

        let grid = scenario.grid().unwrap();
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.tile(3, 1), TileKind::Blocked);
        assert_eq!(grid.tile(7, 2), TileKind::Contested);

        let battle = scenario.build_battle(&data()).unwrap();
        assert_eq!(battle.roster().len(), 2);
        assert_eq!(battle.ally_plans().len(), 1);
    }

    #[test]
    fn test_bad_cell_rejected() {
        let mut scenario = Scenario::from_ron_str(SOURCE, "test.ron").unwrap();
        scenario.rows[0] = "22x00033".to_string();
        assert!(scenario.grid().is_err());
    }

    #[test]
    fn test_unknown_base_rejected() {
        let mut scenario = Scenario::from_ron_str(SOURCE, "test.ron").unwrap();
        scenario.bases[0].name = "castle".to_string();
        assert!(scenario.build_battle(&data()).is_err());
    }
}
