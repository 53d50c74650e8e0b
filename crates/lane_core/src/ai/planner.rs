//! Budget planner: turns a forecast into a timed deployment list.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::analysis::{analyze, lane_bounds, ClusterParams, LaneAnalysis};
use super::strategy::Archetype;
use crate::battle::Battle;
use crate::data::{Catalog, Trait, UnitStats};
use crate::entity::Team;
use crate::error::{GameError, Result};
use crate::forecast::{Forecast, ForecastConfig};
use crate::grid::BattleGrid;
use crate::math::{fixed_decimal, from_millis, Fixed, Vec2Fixed};
use crate::plan::{sort_by_time, DeploymentPlan};

/// Opponent AI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Side the AI deploys for.
    pub team: Team,
    /// Behaviour profile.
    pub archetype: Archetype,
    /// Replaces the archetype's base budget when set.
    pub base_budget: Option<u32>,
    /// Extra budget per stage after the first.
    pub stage_scaling: u32,
    /// Extra budget per round after the first.
    pub round_scaling: u32,
    /// Card names the AI may draw.
    pub deck: Vec<String>,
    /// RNG seed.
    pub seed: u64,
    /// Planning loop iterations.
    pub max_attempts: u32,
    /// Unit plans per round.
    pub max_units: usize,
    /// Closest spawn distance from the AI's own edge.
    pub spawn_band_min: u32,
    /// Farthest spawn distance from the AI's own edge.
    pub spawn_band_max: u32,
    /// Chance of dropping a cluster after targeting it.
    pub forget_chance: f64,
    /// Candidate positions tried per unit.
    pub placement_attempts: u32,
    /// How many of those stay inside the chosen lane.
    pub lane_attempts: u32,
    /// Forecast horizon in seconds.
    #[serde(with = "fixed_decimal")]
    pub round_duration: Fixed,
    /// Cluster detection.
    pub clusters: ClusterParams,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            team: Team::Enemy,
            archetype: Archetype::default(),
            base_budget: None,
            stage_scaling: 2,
            round_scaling: 1,
            deck: Vec::new(),
            seed: 12345,
            max_attempts: 100,
            max_units: 20,
            spawn_band_min: 20,
            spawn_band_max: 100,
            forget_chance: 0.5,
            placement_attempts: 15,
            lane_attempts: 10,
            round_duration: Fixed::from_num(30),
            clusters: ClusterParams::default(),
        }
    }
}

impl AiConfig {
    /// Parse a config from RON source.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the source is malformed.
    pub fn from_ron_str(source: &str, path: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::ron(path, &e))
    }

    /// Set the archetype.
    #[must_use]
    pub fn with_archetype(mut self, archetype: Archetype) -> Self {
        self.archetype = archetype;
        self
    }

    /// Set the deck.
    #[must_use]
    pub fn with_deck<S: Into<String>>(mut self, deck: impl IntoIterator<Item = S>) -> Self {
        self.deck = deck.into_iter().map(Into::into).collect();
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Seeded opponent planner.
#[derive(Debug, Clone)]
pub struct EnemyAi {
    config: AiConfig,
    rng: ChaCha8Rng,
}

impl EnemyAi {
    /// Create a planner seeded from its config.
    #[must_use]
    pub fn new(config: AiConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Restart the random stream.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Budget for a 1-based stage and round.
    #[must_use]
    pub fn budget(&self, stage: u32, round: u32) -> u32 {
        let base = self
            .config
            .base_budget
            .unwrap_or_else(|| self.config.archetype.base_budget());
        base.saturating_add(self.config.stage_scaling.saturating_mul(stage.saturating_sub(1)))
            .saturating_add(self.config.round_scaling.saturating_mul(round.saturating_sub(1)))
    }

    /// Forecast `battle` over a full round and plan against the result.
    pub fn plan_for_battle(
        &mut self,
        battle: &Battle,
        forecast_config: &ForecastConfig,
        stage: u32,
        round: u32,
    ) -> Vec<DeploymentPlan> {
        let horizon = battle.elapsed() + self.config.round_duration;
        let forecast = battle.forecast(horizon, forecast_config);
        self.plan_round(&forecast, battle.grid(), battle.catalog(), stage, round)
    }

    /// Spend this round's budget against a forecast snapshot.
    ///
    /// Returns plans sorted by time.
    pub fn plan_round(
        &mut self,
        forecast: &Forecast,
        grid: &BattleGrid,
        catalog: &Catalog,
        stage: u32,
        round: u32,
    ) -> Vec<DeploymentPlan> {
        let budget = self.budget(stage, round);
        let Self { config, rng } = self;
        let config = &*config;

        let mut analysis = analyze(
            forecast,
            config.team.opponent(),
            grid.field_height(),
            &config.clusters,
            rng,
        );
        let skills: Vec<&str> = config
            .deck
            .iter()
            .map(String::as_str)
            .filter(|card| catalog.skill(card).is_some())
            .collect();

        let mut remaining = budget;
        let mut plans = Vec::new();
        let mut units = 0;

        for _ in 0..config.max_attempts {
            if units >= config.max_units {
                break;
            }
            let affordable = config
                .deck
                .iter()
                .any(|card| catalog.cost_of(card).is_some_and(|cost| cost <= remaining));
            if !affordable {
                break;
            }

            if rng.gen_bool(config.archetype.skill_chance()) {
                if let Some(plan) = plan_skill(config, rng, &skills, &mut analysis, grid, catalog, &mut remaining)
                {
                    plans.push(plan);
                    continue;
                }
            }

            let card = config.deck[rng.gen_range(0..config.deck.len())].as_str();
            if catalog.skill(card).is_some() {
                continue;
            }
            let Some(stats) = catalog.unit(card) else {
                tracing::warn!(card, "Deck card missing from catalog");
                continue;
            };
            if stats.cost > remaining {
                continue;
            }
            if let Some(position) = place_unit(config, rng, stats, &analysis, grid) {
                plans.push(DeploymentPlan::unit(card, config.team, position, spawn_time(rng)));
                remaining -= stats.cost;
                units += 1;
            }
        }

        sort_by_time(&mut plans);
        tracing::debug!(
            archetype = ?config.archetype,
            budget,
            spent = budget - remaining,
            plans = plans.len(),
            "Enemy round planned"
        );
        plans
    }
}

/// Fire a random deck skill at the densest cluster, or at the opposing base.
fn plan_skill(
    config: &AiConfig,
    rng: &mut ChaCha8Rng,
    skills: &[&str],
    analysis: &mut LaneAnalysis,
    grid: &BattleGrid,
    catalog: &Catalog,
    remaining: &mut u32,
) -> Option<DeploymentPlan> {
    if skills.is_empty() {
        return None;
    }
    let name = skills[rng.gen_range(0..skills.len())];
    let cost = catalog.cost_of(name)?;
    if cost > *remaining {
        return None;
    }

    let target = analysis
        .clusters
        .first()
        .map(|c| c.center)
        .or(analysis.opponent_base)?;
    if !grid.is_walkable_at(target) {
        if !analysis.clusters.is_empty() {
            analysis.clusters.remove(0);
        }
        return None;
    }

    *remaining -= cost;
    if !analysis.clusters.is_empty() && rng.gen_bool(config.forget_chance.clamp(0.0, 1.0)) {
        analysis.clusters.remove(0);
    }
    Some(DeploymentPlan::skill(name, config.team, target, spawn_time(rng)))
}

/// First valid spawn point for `unit`, if any candidate passes.
fn place_unit(
    config: &AiConfig,
    rng: &mut ChaCha8Rng,
    unit: &UnitStats,
    analysis: &LaneAnalysis,
    grid: &BattleGrid,
) -> Option<Vec2Fixed> {
    let lane = config.archetype.choose_lane(unit, analysis, rng);
    let (lane_top, lane_bottom) = lane_bounds(lane, grid.field_height());
    let infiltrator = unit.has_trait(Trait::Infiltrator);

    for attempt in 0..config.placement_attempts {
        let (top, bottom) = if attempt < config.lane_attempts {
            (lane_top, lane_bottom)
        } else {
            (Fixed::ZERO, grid.field_height())
        };
        let position = Vec2Fixed::new(spawn_x(config, rng, grid.field_width()), random_between(rng, top, bottom));
        if grid.tile_at(position).is_deployable(config.team, infiltrator) {
            return Some(position);
        }
    }
    None
}

/// X inside the spawn band next to the team's own edge.
fn spawn_x(config: &AiConfig, rng: &mut ChaCha8Rng, field_width: Fixed) -> Fixed {
    let low = config.spawn_band_min.min(config.spawn_band_max);
    let high = config.spawn_band_min.max(config.spawn_band_max);
    let offset = Fixed::from_num(rng.gen_range(low..=high));
    match config.team {
        Team::Ally => offset,
        Team::Enemy => field_width - offset,
    }
}

/// Whole-unit value in `[low, high)`.
fn random_between(rng: &mut ChaCha8Rng, low: Fixed, high: Fixed) -> Fixed {
    let low = low.ceil().to_num::<i32>();
    let high = high.ceil().to_num::<i32>();
    if high <= low {
        return Fixed::from_num(low);
    }
    Fixed::from_num(rng.gen_range(low..high))
}

/// Uniform in 1.0..=6.0 seconds on a 0.1 s grid.
fn spawn_time(rng: &mut ChaCha8Rng) -> Fixed {
    from_millis(rng.gen_range(10..=60) * 100)
}
