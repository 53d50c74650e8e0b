//! Data validation utilities.

use std::path::Path;

use lane_core::ai::AiConfig;
use lane_core::config::BattleConfig;
use lane_core::data::Catalog;
use lane_core::status::CcRuleTable;

use crate::error::{read_to_string, Result, ToolError};

/// Catalog file name inside a data directory.
pub const CATALOG_FILE: &str = "catalog.ron";
/// Crowd-control rule file name. Optional; defaults apply when absent.
pub const CC_RULES_FILE: &str = "cc_rules.ron";
/// Live-loop tuning file name. Optional.
pub const BATTLE_CONFIG_FILE: &str = "battle.ron";
/// Opponent AI file name. Optional.
pub const AI_CONFIG_FILE: &str = "ai.ron";

/// Everything loaded from a data directory.
#[derive(Debug, Clone)]
pub struct DataSet {
    /// Unit and skill templates.
    pub catalog: Catalog,
    /// Crowd-control rules.
    pub cc_rules: CcRuleTable,
    /// Live-loop tuning.
    pub battle: BattleConfig,
    /// Opponent AI settings.
    pub ai: AiConfig,
}

/// Load every data file in `dir`.
///
/// # Errors
///
/// Returns an error if the catalog is missing or any present file fails to
/// parse.
pub fn load_data_directory(dir: &Path) -> Result<DataSet> {
    let catalog_path = dir.join(CATALOG_FILE);
    let catalog = Catalog::from_ron_str(&read_to_string(&catalog_path)?, &display(&catalog_path))?;

    let cc_rules = match optional(dir, CC_RULES_FILE)? {
        Some((source, path)) => CcRuleTable::from_ron_str(&source, &path)?,
        None => CcRuleTable::default(),
    };
    let battle = match optional(dir, BATTLE_CONFIG_FILE)? {
        Some((source, path)) => BattleConfig::from_ron_str(&source, &path)?,
        None => BattleConfig::default(),
    };
    let ai = match optional(dir, AI_CONFIG_FILE)? {
        Some((source, path)) => AiConfig::from_ron_str(&source, &path)?,
        None => AiConfig::default(),
    };

    Ok(DataSet {
        catalog,
        cc_rules,
        battle,
        ai,
    })
}

/// Cross-file consistency problems, empty when valid.
#[must_use]
pub fn check_data_set(data: &DataSet) -> Vec<String> {
    let mut errors = data.catalog.validate();

    for card in &data.ai.deck {
        if data.catalog.cost_of(card).is_none() {
            errors.push(format!("AI deck card '{card}' is not in the catalog"));
        }
    }
    if data.ai.spawn_band_min > data.ai.spawn_band_max {
        errors.push("AI spawn band minimum exceeds maximum".to_string());
    }
    if data.ai.lane_attempts > data.ai.placement_attempts {
        errors.push("AI lane attempts exceed placement attempts".to_string());
    }
    if !(0.0..=1.0).contains(&data.ai.forget_chance)
        || !(0.0..=1.0).contains(&data.ai.clusters.sample_rate)
    {
        errors.push("AI probabilities must lie in 0..=1".to_string());
    }
    if data.battle.replan_interval <= lane_core::math::Fixed::ZERO {
        errors.push("Replan interval must be positive".to_string());
    }

    errors
}

/// Validate all RON data files in a directory.
///
/// # Errors
///
/// Returns an error if any data file fails to load or validate.
pub fn validate_data_directory(path: &Path) -> Result<DataSet> {
    let data = load_data_directory(path)?;
    let errors = check_data_set(&data);
    if !errors.is_empty() {
        return Err(ToolError::Invalid {
            count: errors.len(),
            errors,
        });
    }
    tracing::debug!(
        units = data.catalog.units.len(),
        skills = data.catalog.skills.len(),
        "Data directory valid"
    );
    Ok(data)
}

fn optional(dir: &Path, name: &str) -> Result<Option<(String, String)>> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some((read_to_string(&path)?, display(&path))))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
