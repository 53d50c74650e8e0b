//! Forward simulator: forecasts a future battle state on disposable clones.
//!
//! The forecast copies every active live entity into a [`Ghost`], merges the
//! pending plans of both sides and advances a reduced-fidelity rule set in
//! fixed steps until the target time is reached. It borrows live state
//! immutably and owns every clone it creates, so it can never write back.
//!
//! Compared to the live loop the forecast:
//!
//! - resolves planned skills instantly and only applies damage, shields and stuns
//! - lands skills already cast when their remaining delay runs out
//! - lands projectiles already in flight after their straight-line flight time
//! - skips casting, new projectiles, separation and hooks
//! - measures distance to bases along X only, minus a contact radius
//!
//! # Time
//!
//! Simulated time is tracked in whole milliseconds. The loop steps until
//! `sim_time >= target_time`, so it may overshoot the target by up to one
//! step (a target of 3.35 s finishes at 3.4 s after 34 steps).

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::battle::{PendingSkill, Projectile};
use crate::data::{Catalog, SkillStats, Trait, UnitStats};
use crate::entity::{Entity, EntityId, Roster, Team};
use crate::error::{GameError, Result};
use crate::grid::BattleGrid;
use crate::math::{fixed_decimal, fixed_serde, from_millis, to_millis, Fixed, Vec2Fixed};
use crate::pathfinding::find_path;
use crate::plan::{sort_by_time, DeploymentPlan, PlanKind};
use crate::rules::{self, Combatant, DistanceMetric};
use crate::status::CcKind;

/// Forecast tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Fixed step length in milliseconds.
    pub step_ms: i64,
    /// Effective contact radius of bases.
    #[serde(with = "fixed_decimal")]
    pub base_contact_radius: Fixed,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            step_ms: 100,
            base_contact_radius: Fixed::from_num(80),
        }
    }
}

/// Route a ghost follows around obstacles toward one goal tile.
#[derive(Debug, Clone, Default)]
struct GhostRoute {
    goal: (u32, u32),
    waypoints: VecDeque<Vec2Fixed>,
}

/// A forecast-only clone of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ghost {
    /// Template name.
    pub name: String,
    /// Owning side.
    pub team: Team,
    /// World position.
    pub position: Vec2Fixed,
    /// Deep copy of the stats template.
    pub stats: UnitStats,
    /// Current hit points.
    pub current_hp: i32,
    /// False once dead.
    pub active: bool,
    /// Always true for clones.
    pub is_spawned: bool,
    /// Hidden from hostile targeting.
    pub is_stealthed: bool,
    /// Milliseconds of stun remaining.
    pub stun_ms: i64,
    /// Milliseconds until the next attack.
    pub cooldown_ms: i64,
    /// Bases never move or act.
    pub is_base: bool,
    #[serde(skip)]
    route: Option<GhostRoute>,
}

impl Ghost {
    /// Clone a live entity.
    #[must_use]
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            name: entity.name.clone(),
            team: entity.team,
            position: entity.position,
            stats: entity.stats.clone(),
            current_hp: entity.current_hp,
            active: entity.active,
            is_spawned: true,
            is_stealthed: entity.is_stealthed,
            stun_ms: to_millis(entity.status.remaining(CcKind::Stun)),
            cooldown_ms: to_millis(entity.attack_cooldown),
            is_base: entity.is_base(),
            route: None,
        }
    }

    /// A fresh clone deployed by a plan.
    #[must_use]
    pub fn deploy(name: &str, team: Team, position: Vec2Fixed, stats: &UnitStats) -> Self {
        Self {
            name: name.to_string(),
            team,
            position,
            stats: stats.clone(),
            current_hp: stats.hp,
            active: true,
            is_spawned: true,
            is_stealthed: stats.has_trait(Trait::Stealth),
            stun_ms: 0,
            cooldown_ms: 0,
            is_base: stats.has_trait(Trait::Base),
            route: None,
        }
    }

    fn hash_into(&self, hasher: &mut DefaultHasher) {
        self.name.hash(hasher);
        self.team.hash(hasher);
        self.position.hash(hasher);
        self.current_hp.hash(hasher);
        self.active.hash(hasher);
        self.is_stealthed.hash(hasher);
        self.stun_ms.hash(hasher);
        self.cooldown_ms.hash(hasher);
    }

    /// Move one step toward `dest`, routing around blocked tiles.
    ///
    /// A route is computed at most once per goal tile and followed until it
    /// runs out; otherwise the ghost steps straight when that stays walkable.
    fn advance_toward(&mut self, dest: Vec2Fixed, step: Fixed, grid: &BattleGrid) {
        let (Some(goal), Some(start)) = (
            grid.world_to_tile(grid.clamp_to_field(dest)),
            grid.world_to_tile(grid.clamp_to_field(self.position)),
        ) else {
            return;
        };

        if self.route.as_ref().is_some_and(|r| r.goal != goal) {
            self.route = None;
        }

        if !self.route.as_ref().is_some_and(|r| !r.waypoints.is_empty()) {
            let next = self.position.step_toward(dest, step);
            if grid.is_walkable_at(next) {
                self.position = next;
                return;
            }
            if self.route.is_some() {
                return;
            }
            let mut waypoints: VecDeque<Vec2Fixed> = find_path(grid, start, goal).into();
            if let Some(last) = waypoints.back_mut() {
                *last = dest;
            }
            self.route = Some(GhostRoute { goal, waypoints });
        }

        let tolerance = grid.tile_size() / Fixed::from_num(2);
        let Some(route) = self.route.as_mut() else {
            return;
        };
        while route
            .waypoints
            .front()
            .is_some_and(|wp| self.position.distance(*wp) <= tolerance)
        {
            route.waypoints.pop_front();
        }
        if let Some(&waypoint) = route.waypoints.front() {
            self.position = self.position.step_toward(waypoint, step);
        }
    }
}

impl Combatant for Ghost {
    fn team(&self) -> Team {
        self.team
    }

    fn position(&self) -> Vec2Fixed {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_visible(&self) -> bool {
        self.is_spawned && !self.is_stealthed
    }

    fn is_base(&self) -> bool {
        self.is_base
    }

    fn hp(&self) -> i32 {
        self.current_hp
    }

    fn max_hp(&self) -> i32 {
        self.stats.hp
    }
}

/// Read-only view of everything a forecast needs.
#[derive(Debug, Clone, Copy)]
pub struct ForecastInput<'a> {
    /// Live roster to clone.
    pub roster: &'a Roster,
    /// Walkability.
    pub grid: &'a BattleGrid,
    /// Templates for plan execution.
    pub catalog: &'a Catalog,
    /// Pending player plans.
    pub ally_plans: &'a [DeploymentPlan],
    /// Pending opponent plans.
    pub enemy_plans: &'a [DeploymentPlan],
    /// Skills cast on the live field that have not landed yet.
    pub pending_skills: &'a [PendingSkill],
    /// Projectiles in flight on the live field.
    pub projectiles: &'a [Projectile],
    /// Round time the live state corresponds to.
    pub start_time: Fixed,
}

/// Result of a forecast run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    /// Every clone, dead and alive, in creation order.
    pub ghosts: Vec<Ghost>,
    /// Simulated time reached.
    #[serde(with = "fixed_serde")]
    pub sim_time: Fixed,
    /// Number of fixed steps taken.
    pub steps: u32,
}

impl Forecast {
    /// Living clones of a team.
    pub fn alive(&self, team: Team) -> impl Iterator<Item = &Ghost> {
        self.ghosts
            .iter()
            .filter(move |g| g.active && g.team == team)
    }

    /// Position of the first living base of a team.
    #[must_use]
    pub fn base_position(&self, team: Team) -> Option<Vec2Fixed> {
        self.alive(team).find(|g| g.is_base).map(|g| g.position)
    }

    /// Deterministic hash of the snapshot.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.steps.hash(&mut hasher);
        self.sim_time.to_bits().hash(&mut hasher);
        self.ghosts.len().hash(&mut hasher);
        for ghost in &self.ghosts {
            ghost.hash_into(&mut hasher);
        }
        hasher.finish()
    }

    /// Serialize the snapshot to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize forecast: {e}")))
    }
}

/// Run a forecast from `input.start_time` to `target_time`.
#[must_use]
pub fn run_forecast(input: &ForecastInput<'_>, target_time: Fixed, config: &ForecastConfig) -> Forecast {
    let (ids, mut ghosts): (Vec<EntityId>, Vec<Ghost>) = input
        .roster
        .iter()
        .filter(|(_, e)| e.active)
        .map(|(id, e)| (id, Ghost::from_entity(e)))
        .unzip();

    let mut plans: Vec<DeploymentPlan> = input
        .ally_plans
        .iter()
        .chain(input.enemy_plans)
        .filter(|p| !p.spawned)
        .cloned()
        .collect();
    sort_by_time(&mut plans);
    let mut executed = vec![false; plans.len()];

    let step_ms = config.step_ms.max(1);
    let target_ms = to_millis(target_time);
    let mut now_ms = to_millis(input.start_time);
    let mut steps: u32 = 0;

    let impacts = in_flight_impacts(input, &ids, &ghosts, now_ms);
    let mut landed = vec![false; impacts.len()];

    let metric = DistanceMetric::BaseContact {
        contact_radius: config.base_contact_radius,
    };

    while now_ms < target_ms {
        now_ms += step_ms;
        steps += 1;

        for (&(due_ms, impact), done) in impacts.iter().zip(landed.iter_mut()) {
            if *done || due_ms > now_ms {
                continue;
            }
            *done = true;
            impact.land(&mut ghosts);
        }

        for (plan, done) in plans.iter().zip(executed.iter_mut()) {
            if *done || plan.time_millis() > now_ms {
                continue;
            }
            *done = true;
            execute_plan(plan, input, &mut ghosts);
        }

        for index in 0..ghosts.len() {
            step_ghost(index, &mut ghosts, input.grid, metric, step_ms);
        }
    }

    let forecast = Forecast {
        ghosts,
        sim_time: from_millis(now_ms),
        steps,
    };
    tracing::debug!(
        steps = forecast.steps,
        state_hash = forecast.state_hash(),
        "Forecast complete"
    );
    forecast
}

/// Effect committed on the live field before the forecast started.
#[derive(Debug, Clone, Copy)]
enum Impact<'a> {
    Skill(&'a PendingSkill),
    Shot { ghost: usize, damage: i32 },
}

impl Impact<'_> {
    fn land(self, ghosts: &mut [Ghost]) {
        match self {
            Impact::Skill(skill) => apply_skill(&skill.stats, skill.center, skill.affected_team, ghosts),
            Impact::Shot { ghost, damage } => {
                let target = &mut ghosts[ghost];
                let max_hp = target.stats.hp;
                rules::apply_hp_delta(
                    &mut target.current_hp,
                    &mut target.active,
                    max_hp,
                    damage,
                    i32::MAX,
                );
            }
        }
    }
}

/// In-flight effects keyed by the round time they land, earliest first.
///
/// Shots whose target has no ghost fizzle, matching the live loop.
fn in_flight_impacts<'a>(
    input: &ForecastInput<'a>,
    ids: &[EntityId],
    ghosts: &[Ghost],
    now_ms: i64,
) -> Vec<(i64, Impact<'a>)> {
    let skills = input
        .pending_skills
        .iter()
        .map(|skill| (now_ms + to_millis(skill.remaining).max(0), Impact::Skill(skill)));

    let shots = input.projectiles.iter().filter_map(|projectile| {
        let ghost = ids.iter().position(|&id| id == projectile.target)?;
        let distance = projectile.position.distance(ghosts[ghost].position);
        let flight_ms = if projectile.speed > Fixed::ZERO {
            to_millis(distance / projectile.speed)
        } else {
            0
        };
        Some((
            now_ms + flight_ms,
            Impact::Shot {
                ghost,
                damage: projectile.damage,
            },
        ))
    });

    let mut impacts: Vec<_> = skills.chain(shots).collect();
    impacts.sort_by_key(|(due_ms, _)| *due_ms);
    impacts
}

fn execute_plan(plan: &DeploymentPlan, input: &ForecastInput<'_>, ghosts: &mut Vec<Ghost>) {
    let team = plan.resolve_team(input.grid.field_width());
    match plan.kind {
        PlanKind::Unit => {
            let Some(stats) = input.catalog.unit(&plan.name) else {
                tracing::warn!(name = %plan.name, "Forecast skipped unknown unit");
                return;
            };
            for position in plan.spawn_positions(stats.spawn_count()) {
                ghosts.push(Ghost::deploy(&plan.name, team, position, stats));
            }
        }
        PlanKind::Skill => {
            let Some(skill) = input.catalog.skill(&plan.name) else {
                tracing::warn!(name = %plan.name, "Forecast skipped unknown skill");
                return;
            };
            apply_skill(skill, plan.position(), skill.affected_team(team), ghosts);
        }
    }
}

/// Instant, reduced-fidelity skill: damage, shield and stun only.
fn apply_skill(skill: &SkillStats, center: Vec2Fixed, affected: Team, ghosts: &mut [Ghost]) {
    let hits = rules::area_targets(
        ghosts.iter().enumerate(),
        center,
        skill.radius,
        affected,
        skill.friendly_fire,
    );

    for index in hits {
        let ghost = &mut ghosts[index];
        let max_hp = ghost.stats.hp;
        if skill.damage > 0 {
            rules::apply_hp_delta(
                &mut ghost.current_hp,
                &mut ghost.active,
                max_hp,
                skill.damage,
                i32::MAX,
            );
        }
        if skill.shield > 0 {
            rules::apply_hp_delta(
                &mut ghost.current_hp,
                &mut ghost.active,
                max_hp,
                -skill.shield,
                i32::MAX,
            );
        }
        if let Some(stun) = skill.stun {
            if ghost.active && !ghost.is_base {
                ghost.stun_ms = rules::merge_duration(ghost.stun_ms, to_millis(stun));
            }
        }
    }
}

fn step_ghost(
    index: usize,
    ghosts: &mut [Ghost],
    grid: &BattleGrid,
    metric: DistanceMetric,
    step_ms: i64,
) {
    {
        let ghost = &mut ghosts[index];
        if !ghost.active || ghost.is_base {
            return;
        }
        if ghost.stun_ms > 0 {
            ghost.stun_ms = (ghost.stun_ms - step_ms).max(0);
            return;
        }
        ghost.cooldown_ms = (ghost.cooldown_ms - step_ms).max(0);
    }

    let (team, position, healer) = {
        let ghost = &ghosts[index];
        (ghost.team, ghost.position, ghost.stats.damage < 0)
    };

    let target = if healer {
        rules::nearest_injured_ally(ghosts.iter().enumerate(), team, position, &index)
    } else {
        rules::nearest_hostile(ghosts.iter().enumerate(), team, position, metric)
    };

    let step = ghosts[index].stats.speed * from_millis(step_ms);

    let Some((target_index, distance)) = target else {
        let edge_x = if team == Team::Ally {
            grid.field_width() - grid.tile_size() / Fixed::from_num(2)
        } else {
            grid.tile_size() / Fixed::from_num(2)
        };
        let dest = Vec2Fixed::new(edge_x, position.y);
        ghosts[index].advance_toward(dest, step, grid);
        return;
    };

    let (target_pos, target_is_base) = {
        let target = &ghosts[target_index];
        (target.position, target.is_base)
    };

    let (range, damage, attack_speed, cooldown) = {
        let ghost = &ghosts[index];
        (
            ghost.stats.range,
            ghost.stats.damage,
            ghost.stats.attack_speed,
            ghost.cooldown_ms,
        )
    };

    if distance <= range {
        if cooldown <= 0 {
            let target = &mut ghosts[target_index];
            let max_hp = target.stats.hp;
            rules::apply_hp_delta(
                &mut target.current_hp,
                &mut target.active,
                max_hp,
                damage,
                i32::MAX,
            );
            ghosts[index].cooldown_ms = to_millis(attack_speed);
        }
        return;
    }

    let dest = if target_is_base {
        Vec2Fixed::new(target_pos.x, position.y)
    } else {
        target_pos
    };
    ghosts[index].advance_toward(dest, step, grid);
}

/// Rate limiter for reactive re-forecasting.
///
/// Callers supply a monotonic wall-clock reading; the core never reads the
/// clock itself.
#[derive(Debug, Clone)]
pub struct ForecastThrottle {
    min_interval: Duration,
    last_run: Option<Duration>,
}

impl Default for ForecastThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

impl ForecastThrottle {
    /// Allow at most one forecast per `min_interval`.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run: None,
        }
    }

    /// Returns true (and records `now`) if a forecast may run at `now`.
    pub fn poll(&mut self, now: Duration) -> bool {
        let ready = self
            .last_run
            .map_or(true, |last| now.saturating_sub(last) >= self.min_interval);
        if ready {
            self.last_run = Some(now);
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileKind;

    fn grid() -> BattleGrid {
        BattleGrid::filled(40, 15, Fixed::from_num(20), TileKind::Neutral).unwrap()
    }

    fn soldier() -> UnitStats {
        UnitStats {
            cost: 2,
            hp: 50,
            damage: 10,
            range: Fixed::from_num(20),
            attack_speed: Fixed::ONE,
            speed: Fixed::from_num(50),
            ..UnitStats::default()
        }
    }

    fn input<'a>(
        roster: &'a Roster,
        grid: &'a BattleGrid,
        catalog: &'a Catalog,
        plans: &'a [DeploymentPlan],
    ) -> ForecastInput<'a> {
        ForecastInput {
            roster,
            grid,
            catalog,
            ally_plans: plans,
            enemy_plans: &[],
            pending_skills: &[],
            projectiles: &[],
            start_time: Fixed::ZERO,
        }
    }

    #[test]
    fn test_overshoot_boundary() {
        let grid = grid();
        let roster = Roster::new();
        let catalog = Catalog::default();
        let forecast = run_forecast(
            &input(&roster, &grid, &catalog, &[]),
            Fixed::from_num(3.35),
            &ForecastConfig::default(),
        );

        assert_eq!(forecast.steps, 34);
        assert_eq!(to_millis(forecast.sim_time), 3400);
        assert!(forecast.ghosts.is_empty());
    }

    #[test]
    fn test_plan_executes_once_with_team_inferred() {
        let grid = grid();
        let roster = Roster::new();
        let mut catalog = Catalog::default();
        catalog.insert_unit("soldier", soldier());
        let mut plan =
            DeploymentPlan::unit("soldier", Team::Ally, Vec2Fixed::from_int(700, 100), Fixed::from_num(0.5));
        plan.team = None;

        let forecast = run_forecast(
            &input(&roster, &grid, &catalog, &[plan]),
            Fixed::from_num(2),
            &ForecastConfig::default(),
        );

        assert_eq!(forecast.ghosts.len(), 1);
        let ghost = &forecast.ghosts[0];
        assert_eq!(ghost.team, Team::Enemy);
        assert!(ghost.position.x < Fixed::from_num(700), "enemy advances toward x = 0");
    }

    #[test]
    fn test_unknown_plan_is_skipped() {
        let grid = grid();
        let roster = Roster::new();
        let catalog = Catalog::default();
        let plans = [DeploymentPlan::unit(
            "dragon",
            Team::Ally,
            Vec2Fixed::from_int(100, 100),
            Fixed::ZERO,
        )];

        let forecast = run_forecast(
            &input(&roster, &grid, &catalog, &plans),
            Fixed::ONE,
            &ForecastConfig::default(),
        );
        assert!(forecast.ghosts.is_empty());
        assert_eq!(forecast.steps, 10);
    }

    #[test]
    fn test_stunned_ghost_waits() {
        let grid = grid();
        let mut roster = Roster::new();
        let mut stunned = Entity::spawn("soldier", Team::Ally, Vec2Fixed::from_int(100, 100), soldier(), Fixed::ZERO);
        stunned.status.apply(CcKind::Stun, Fixed::from_num(0.5));
        roster.insert(stunned);
        let catalog = Catalog::default();

        let forecast = run_forecast(
            &input(&roster, &grid, &catalog, &[]),
            Fixed::from_num(0.5),
            &ForecastConfig::default(),
        );
        assert_eq!(forecast.ghosts[0].position, Vec2Fixed::from_int(100, 100));
        assert_eq!(forecast.ghosts[0].stun_ms, 0);
    }

    #[test]
    fn test_base_contact_stops_approach() {
        let grid = grid();
        let mut roster = Roster::new();
        let mut base_stats = soldier();
        base_stats.traits.insert(Trait::Base);
        base_stats.hp = 1000;
        roster.insert(Entity::spawn("keep", Team::Enemy, Vec2Fixed::from_int(700, 20), base_stats, Fixed::ZERO));
        roster.insert(Entity::spawn("soldier", Team::Ally, Vec2Fixed::from_int(500, 200), soldier(), Fixed::ZERO));
        let catalog = Catalog::default();

        let forecast = run_forecast(
            &input(&roster, &grid, &catalog, &[]),
            Fixed::from_num(10),
            &ForecastConfig::default(),
        );

        let attacker = &forecast.ghosts[1];
        // X-only approach: no lateral drift, halts at contact radius + range.
        assert_eq!(attacker.position.y, Fixed::from_num(200));
        assert!(attacker.position.x >= Fixed::from_num(600));
        assert!(forecast.ghosts[0].current_hp < 1000);
        assert_eq!(forecast.ghosts[0].position, Vec2Fixed::from_int(700, 20));
    }

    #[test]
    fn test_ghost_routes_around_wall() {
        let mut grid = grid();
        for y in 0..12 {
            grid.set_tile(10, y, TileKind::Blocked);
        }
        let mut roster = Roster::new();
        roster.insert(Entity::spawn("soldier", Team::Ally, Vec2Fixed::from_int(150, 50), soldier(), Fixed::ZERO));
        roster.insert(Entity::spawn("soldier", Team::Enemy, Vec2Fixed::from_int(300, 50), soldier(), Fixed::ZERO));
        let catalog = Catalog::default();

        let forecast = run_forecast(
            &input(&roster, &grid, &catalog, &[]),
            Fixed::from_num(20),
            &ForecastConfig::default(),
        );

        for ghost in &forecast.ghosts {
            assert!(grid.is_walkable_at(ghost.position), "{} inside a wall", ghost.name);
        }
        assert!(forecast.ghosts.iter().any(|g| g.current_hp < 50));
    }

    #[test]
    fn test_skill_reduced_fidelity() {
        let grid = grid();
        let mut roster = Roster::new();
        roster.insert(Entity::spawn("soldier", Team::Enemy, Vec2Fixed::from_int(400, 100), soldier(), Fixed::ZERO));
        let mut catalog = Catalog::default();
        catalog.insert_skill(
            "quake",
            SkillStats {
                radius: Fixed::from_num(60),
                damage: 15,
                stun: Some(Fixed::from_num(5)),
                cc: [(CcKind::Knockback, Fixed::ONE)].into_iter().collect(),
                ..SkillStats::default()
            },
        );
        let plans = [DeploymentPlan::skill("quake", Team::Ally, Vec2Fixed::from_int(400, 100), Fixed::ZERO)];

        let forecast = run_forecast(
            &input(&roster, &grid, &catalog, &plans),
            Fixed::ONE,
            &ForecastConfig::default(),
        );

        let ghost = &forecast.ghosts[0];
        assert_eq!(ghost.current_hp, 35);
        // Stunned, not knocked back.
        assert_eq!(ghost.position, Vec2Fixed::from_int(400, 100));
        assert_eq!(ghost.stun_ms, 4000);
    }

    #[test]
    fn test_in_flight_effects_land_on_schedule() {
        let grid = grid();
        let mut roster = Roster::new();
        let target = roster.insert(Entity::spawn("soldier", Team::Enemy, Vec2Fixed::from_int(400, 100), soldier(), Fixed::ZERO));
        let catalog = Catalog::default();
        let skills = [PendingSkill {
            name: "quake".to_string(),
            stats: SkillStats {
                radius: Fixed::from_num(60),
                damage: 15,
                ..SkillStats::default()
            },
            center: Vec2Fixed::from_int(400, 100),
            affected_team: Team::Enemy,
            remaining: Fixed::from_num(0.3),
        }];
        let shot = |target| Projectile {
            attacker: EntityId::new(5, 0),
            target,
            position: Vec2Fixed::from_int(300, 100),
            speed: Fixed::from_num(200),
            damage: 12,
        };
        // The second shot's target is gone and fizzles.
        let shots = [shot(target), shot(EntityId::new(9, 0))];
        let input = ForecastInput {
            pending_skills: &skills,
            projectiles: &shots,
            ..input(&roster, &grid, &catalog, &[])
        };

        let early = run_forecast(&input, Fixed::from_num(0.2), &ForecastConfig::default());
        assert_eq!(early.ghosts[0].current_hp, 50);

        let after_skill = run_forecast(&input, Fixed::from_num(0.3), &ForecastConfig::default());
        assert_eq!(after_skill.ghosts[0].current_hp, 35);

        let settled = run_forecast(&input, Fixed::from_num(2), &ForecastConfig::default());
        assert_eq!(settled.ghosts[0].current_hp, 23);
    }

    #[test]
    fn test_throttle() {
        let mut throttle = ForecastThrottle::default();
        assert!(throttle.poll(Duration::from_millis(0)));
        assert!(!throttle.poll(Duration::from_millis(30)));
        assert!(throttle.poll(Duration::from_millis(50)));
        assert!(!throttle.poll(Duration::from_millis(99)));
        assert!(throttle.poll(Duration::from_millis(200)));
    }
}
