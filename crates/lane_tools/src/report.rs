//! JSON summaries printed by the CLI.

use serde::Serialize;

use lane_core::ai::EnemyAi;
use lane_core::battle::{Battle, BattleOutcome, GameSpeed};
use lane_core::combat::{CombatHooks, HookCommand};
use lane_core::entity::{Entity, EntityId, Team};
use lane_core::forecast::{Forecast, ForecastConfig};
use lane_core::math::{to_millis, Fixed};
use lane_core::plan::DeploymentPlan;

/// One forecast clone.
#[derive(Debug, Clone, Serialize)]
pub struct GhostSummary {
    /// Template name.
    pub name: String,
    /// Owning side.
    pub team: Team,
    /// Final position.
    pub x: f64,
    /// Final position.
    pub y: f64,
    /// Remaining hit points.
    pub hp: i32,
    /// Still alive.
    pub alive: bool,
}

/// A finished forecast.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    /// Simulated time reached.
    pub sim_time: f64,
    /// Steps taken.
    pub steps: u32,
    /// Living ally clones.
    pub ally_alive: usize,
    /// Living enemy clones.
    pub enemy_alive: usize,
    /// Snapshot hash.
    pub state_hash: u64,
    /// Every clone.
    pub ghosts: Vec<GhostSummary>,
}

impl ForecastSummary {
    /// Summarize a forecast.
    #[must_use]
    pub fn from_forecast(forecast: &Forecast) -> Self {
        Self {
            sim_time: forecast.sim_time.to_num(),
            steps: forecast.steps,
            ally_alive: forecast.alive(Team::Ally).count(),
            enemy_alive: forecast.alive(Team::Enemy).count(),
            state_hash: forecast.state_hash(),
            ghosts: forecast
                .ghosts
                .iter()
                .map(|g| GhostSummary {
                    name: g.name.clone(),
                    team: g.team,
                    x: g.position.x.to_num(),
                    y: g.position.y.to_num(),
                    hp: g.current_hp,
                    alive: g.active,
                })
                .collect(),
        }
    }
}

/// Death and cost bookkeeping for a headless round.
#[derive(Debug, Clone, Default)]
pub struct RoundTally {
    /// Ally deaths.
    pub ally_deaths: u32,
    /// Enemy deaths.
    pub enemy_deaths: u32,
}

impl CombatHooks for RoundTally {
    fn on_unit_death(&mut self, _id: EntityId, entity: &Entity) -> Vec<HookCommand> {
        match entity.team {
            Team::Ally => self.ally_deaths += 1,
            Team::Enemy => self.enemy_deaths += 1,
        }
        Vec::new()
    }
}

/// A finished headless round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    /// Final outcome.
    pub outcome: BattleOutcome,
    /// Seconds simulated.
    pub elapsed: f64,
    /// Frames run.
    pub ticks: u64,
    /// Living non-base allies at the end.
    pub ally_alive: usize,
    /// Living non-base enemies at the end.
    pub enemy_alive: usize,
    /// Ally deaths.
    pub ally_deaths: u32,
    /// Enemy deaths.
    pub enemy_deaths: u32,
    /// Enemy plans the AI produced, if it ran.
    pub enemy_plans: Vec<PlanSummary>,
    /// Final state hash.
    pub state_hash: u64,
}

/// One deployment plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    /// Catalog name.
    pub name: String,
    /// Target X.
    pub x: f64,
    /// Target Y.
    pub y: f64,
    /// Execution time in seconds.
    pub time: f64,
}

impl From<&DeploymentPlan> for PlanSummary {
    fn from(plan: &DeploymentPlan) -> Self {
        Self {
            name: plan.name.clone(),
            x: plan.x.to_num(),
            y: plan.y.to_num(),
            time: plan.time.to_num(),
        }
    }
}

/// Forecast a battle to `horizon` seconds.
#[must_use]
pub fn forecast_battle(battle: &Battle, horizon: Fixed, config: &ForecastConfig) -> ForecastSummary {
    ForecastSummary::from_forecast(&battle.forecast(horizon, config))
}

/// Let `ai` plan the enemy side, then run the round at `frame` seconds per
/// tick until a base falls or `max_seconds` pass.
pub fn run_round(
    battle: &mut Battle,
    ai: Option<&mut EnemyAi>,
    frame: Fixed,
    max_seconds: Fixed,
) -> RoundSummary {
    let mut enemy_plans = Vec::new();
    if let Some(ai) = ai {
        let plans = ai.plan_for_battle(battle, &ForecastConfig::default(), 1, 1);
        enemy_plans = plans.iter().map(PlanSummary::from).collect();
        battle.set_enemy_plans(plans);
    }

    let mut tally = RoundTally::default();
    battle.start_round(&mut tally);

    let mut ticks = 0;
    let limit_ms = to_millis(max_seconds);
    while battle.outcome() == BattleOutcome::InProgress && to_millis(battle.elapsed()) < limit_ms {
        battle.tick(frame, GameSpeed::Normal, &mut tally);
        ticks += 1;
    }

    RoundSummary {
        outcome: battle.outcome(),
        elapsed: battle.elapsed().to_num(),
        ticks,
        ally_alive: battle.roster().count_active(Team::Ally, false),
        enemy_alive: battle.roster().count_active(Team::Enemy, false),
        ally_deaths: tally.ally_deaths,
        enemy_deaths: tally.enemy_deaths,
        enemy_plans,
        state_hash: battle.state_hash(),
    }
}

/// Render a summary as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json<T: Serialize>(summary: &T) -> crate::error::Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_core::ai::AiConfig;
    use lane_test_utils::determinism::frame;
    use lane_test_utils::fixtures::{empty_battle, open_grid, skirmish};

    #[test]
    fn test_forecast_summary_counts() {
        let battle = skirmish();
        let summary = forecast_battle(&battle, Fixed::from_num(1), &ForecastConfig::default());
        assert_eq!(summary.steps, 10);
        assert!(summary.ally_alive >= 1);
        assert!(to_json(&summary).unwrap().contains("\"steps\": 10"));
    }

    #[test]
    fn test_round_stops_at_time_limit() {
        let (mut battle, _, _) = empty_battle(open_grid());
        let summary = run_round(&mut battle, None, frame(), Fixed::from_num(2));
        assert_eq!(summary.outcome, BattleOutcome::InProgress);
        assert_eq!(summary.ticks, 20);
        assert_eq!(summary.ally_deaths + summary.enemy_deaths, 0);
    }

    #[test]
    fn test_round_with_ai_plans_enemy_side() {
        let (mut battle, _, _) = empty_battle(open_grid());
        let mut ai = EnemyAi::new(AiConfig::default().with_deck(["soldier", "archer"]));
        let summary = run_round(&mut battle, Some(&mut ai), frame(), Fixed::from_num(7));
        assert!(!summary.enemy_plans.is_empty());
        assert!(summary.enemy_alive > 0 || summary.enemy_deaths > 0);
    }
}
