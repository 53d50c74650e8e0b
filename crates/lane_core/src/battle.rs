//! Live battle loop.
//!
//! [`Battle`] owns the roster arena and advances it one rendered frame at a
//! time:
//!
//! 1. execute due plans in ascending time order
//! 2. snapshot the roster and update every entity against the snapshot
//! 3. separate overlapping units
//! 4. resolve attacks fired this tick, in roster order
//! 5. advance projectiles and pending skill impacts
//! 6. sweep dead entities
//!
//! Deletions only happen in step 6, so handles stay valid for the whole tick.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combat::{CombatContext, CombatEvent, CombatHooks};
use crate::config::BattleConfig;
use crate::data::{Catalog, SkillStats};
use crate::entity::{Entity, EntityId, Roster, Team};
use crate::error::Result;
use crate::forecast::{run_forecast, Forecast, ForecastConfig, ForecastInput};
use crate::grid::BattleGrid;
use crate::math::{fixed_serde, to_millis, Fixed, Vec2Fixed};
use crate::plan::{retain_pending, sort_by_time, DeploymentPlan, PlanKind};
use crate::status::CcRuleTable;
use crate::targeting::{self, FireIntent, TargetView, TickContext};

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameSpeed {
    /// Time stands still.
    Paused,
    /// Real time.
    #[default]
    Normal,
    /// Twice real time.
    Double,
}

impl GameSpeed {
    /// Multiplier applied to frame time.
    #[must_use]
    pub fn multiplier(self) -> Fixed {
        match self {
            Self::Paused => Fixed::ZERO,
            Self::Normal => Fixed::ONE,
            Self::Double => Fixed::from_num(2),
        }
    }
}

/// Projectile in flight toward a live target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    /// Firing entity.
    pub attacker: EntityId,
    /// Homing target.
    pub target: EntityId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Flight speed in world units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage applied on arrival.
    pub damage: i32,
}

/// Skill waiting for its impact delay.
#[derive(Debug, Clone)]
pub struct PendingSkill {
    /// Catalog key.
    pub name: String,
    /// Effect applied on impact.
    pub stats: SkillStats,
    /// Impact point.
    pub center: Vec2Fixed,
    /// Team the effect lands on.
    pub affected_team: Team,
    /// Time left until impact.
    pub remaining: Fixed,
}

/// State of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Both sides still have a base, or no bases were placed.
    InProgress,
    /// The other side lost every base.
    Victory(Team),
    /// Both sides lost every base.
    Draw,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Combat events in resolution order.
    pub events: Vec<CombatEvent>,
    /// Entities deployed this tick.
    pub spawned: Vec<EntityId>,
    /// Entities swept this tick.
    pub removed: Vec<EntityId>,
    /// New path searches started.
    pub path_requests: u32,
    /// Net cost change requested by hooks.
    pub cost_delta: i32,
}

/// The live, authoritative battle.
#[derive(Debug, Clone)]
pub struct Battle {
    roster: Roster,
    grid: BattleGrid,
    catalog: Catalog,
    cc_rules: CcRuleTable,
    config: BattleConfig,
    ally_plans: Vec<DeploymentPlan>,
    enemy_plans: Vec<DeploymentPlan>,
    projectiles: Vec<Projectile>,
    pending_skills: Vec<PendingSkill>,
    bases: Vec<(Team, EntityId)>,
    elapsed: Fixed,
}

impl Battle {
    /// Create an empty battle.
    #[must_use]
    pub fn new(
        grid: BattleGrid,
        catalog: Catalog,
        cc_rules: CcRuleTable,
        config: BattleConfig,
    ) -> Self {
        Self {
            roster: Roster::new(),
            grid,
            catalog,
            cc_rules,
            config,
            ally_plans: Vec::new(),
            enemy_plans: Vec::new(),
            projectiles: Vec::new(),
            pending_skills: Vec::new(),
            bases: Vec::new(),
            elapsed: Fixed::ZERO,
        }
    }

    /// The roster.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Mutable roster access for setup and tests.
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// The grid.
    #[must_use]
    pub fn grid(&self) -> &BattleGrid {
        &self.grid
    }

    /// The catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Live-loop tuning.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Seconds since round start.
    #[must_use]
    pub fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Skills cast but not yet landed.
    #[must_use]
    pub fn pending_skills(&self) -> &[PendingSkill] {
        &self.pending_skills
    }

    /// Pending player plans.
    #[must_use]
    pub fn ally_plans(&self) -> &[DeploymentPlan] {
        &self.ally_plans
    }

    /// Pending opponent plans.
    #[must_use]
    pub fn enemy_plans(&self) -> &[DeploymentPlan] {
        &self.enemy_plans
    }

    /// Place a team base.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownTemplate`] if the catalog has no such unit.
    pub fn place_base(&mut self, name: &str, team: Team, position: Vec2Fixed) -> Result<EntityId> {
        let stats = self.catalog.require_unit(name)?.clone();
        let id = self
            .roster
            .insert(Entity::spawn(name, team, position, stats, Fixed::ZERO));
        self.bases.push((team, id));
        Ok(id)
    }

    /// Deploy a unit immediately, bypassing plans.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownTemplate`] if the catalog has no such unit.
    pub fn spawn_unit(&mut self, name: &str, team: Team, position: Vec2Fixed) -> Result<EntityId> {
        let stats = self.catalog.require_unit(name)?.clone();
        Ok(self.roster.insert(Entity::spawn(
            name,
            team,
            position,
            stats,
            self.config.spawn_grace,
        )))
    }

    /// Append plans for a side.
    pub fn add_plans(&mut self, team: Team, plans: impl IntoIterator<Item = DeploymentPlan>) {
        let list = match team {
            Team::Ally => &mut self.ally_plans,
            Team::Enemy => &mut self.enemy_plans,
        };
        list.extend(plans);
        sort_by_time(list);
    }

    /// Replace the opponent's plans, e.g. with a fresh AI plan list.
    pub fn set_enemy_plans(&mut self, plans: Vec<DeploymentPlan>) {
        self.enemy_plans = plans;
        sort_by_time(&mut self.enemy_plans);
    }

    /// Begin a new round: drop executed plans, reset the clock and fire the
    /// round-start hook.
    pub fn start_round(&mut self, hooks: &mut dyn CombatHooks) -> TickReport {
        retain_pending(&mut self.ally_plans);
        retain_pending(&mut self.enemy_plans);
        self.elapsed = Fixed::ZERO;

        let mut combat = CombatContext::new(&mut self.roster, &self.grid, &self.config, hooks);
        combat.round_start();
        TickReport {
            cost_delta: combat.cost_delta,
            events: combat.events,
            ..TickReport::default()
        }
    }

    /// Advance one frame of `frame_dt` seconds at `speed`.
    pub fn tick(&mut self, frame_dt: Fixed, speed: GameSpeed, hooks: &mut dyn CombatHooks) -> TickReport {
        let mut report = TickReport::default();
        let dt = frame_dt * speed.multiplier();
        if dt <= Fixed::ZERO {
            return report;
        }
        self.elapsed += dt;

        report.spawned = self.execute_due_plans();

        let view = TargetView::capture(&self.roster);
        let ctx = TickContext {
            view: &view,
            grid: &self.grid,
            cc_rules: &self.cc_rules,
            config: &self.config,
            dt,
        };
        let mut intents = Vec::new();
        for id in self.roster.ids() {
            let Some(entity) = self.roster.get_mut(id) else {
                continue;
            };
            let update = targeting::update_entity(id, entity, &ctx);
            if update.requested_path {
                report.path_requests += 1;
            }
            intents.extend(update.fire);
        }

        targeting::apply_separation(&mut self.roster, &self.grid, &self.cc_rules, &self.config, dt);

        let mut combat = CombatContext::new(&mut self.roster, &self.grid, &self.config, hooks);
        for intent in intents {
            if let Some(projectile) = resolve_fire(&mut combat, intent) {
                self.projectiles.push(projectile);
            }
        }
        advance_projectiles(&mut combat, &mut self.projectiles, dt);
        advance_skills(&mut combat, &mut self.pending_skills, dt);

        report.cost_delta = combat.cost_delta;
        report.events = combat.events;
        report.removed = self.roster.sweep_dead();

        if cfg!(feature = "debug-validation") {
            tracing::debug!(
                elapsed_ms = to_millis(self.elapsed),
                state_hash = self.state_hash(),
                "Battle state hash"
            );
        }

        report
    }

    /// Execute every unspawned plan whose time has come, across both
    /// sides, in ascending time order.
    fn execute_due_plans(&mut self) -> Vec<EntityId> {
        let now_ms = to_millis(self.elapsed);
        let mut due: Vec<(i64, Team, usize)> = Vec::new();
        for (team, list) in [(Team::Ally, &self.ally_plans), (Team::Enemy, &self.enemy_plans)] {
            for (index, plan) in list.iter().enumerate() {
                if !plan.spawned && plan.time_millis() <= now_ms {
                    due.push((plan.time_millis(), team, index));
                }
            }
        }
        due.sort_by_key(|(time, _, _)| *time);

        let mut spawned = Vec::new();
        for (_, side, index) in due {
            let list = match side {
                Team::Ally => &mut self.ally_plans,
                Team::Enemy => &mut self.enemy_plans,
            };
            let Some(plan) = list.get_mut(index) else {
                continue;
            };
            plan.spawned = true;
            let plan = plan.clone();
            spawned.extend(self.execute_plan(&plan));
        }
        spawned
    }

    fn execute_plan(&mut self, plan: &DeploymentPlan) -> Vec<EntityId> {
        let team = plan.resolve_team(self.grid.field_width());
        match plan.kind {
            PlanKind::Unit => {
                let Some(stats) = self.catalog.unit(&plan.name) else {
                    tracing::warn!(name = %plan.name, "Skipping plan for unknown unit");
                    return Vec::new();
                };
                plan.spawn_positions(stats.spawn_count())
                    .into_iter()
                    .map(|position| {
                        let entity = Entity::spawn(
                            plan.name.as_str(),
                            team,
                            position,
                            stats.clone(),
                            self.config.spawn_grace,
                        );
                        self.roster.insert(entity)
                    })
                    .collect()
            }
            PlanKind::Skill => {
                let Some(stats) = self.catalog.skill(&plan.name) else {
                    tracing::warn!(name = %plan.name, "Skipping plan for unknown skill");
                    return Vec::new();
                };
                self.pending_skills.push(PendingSkill {
                    name: plan.name.clone(),
                    stats: stats.clone(),
                    center: plan.position(),
                    affected_team: stats.affected_team(team),
                    remaining: self.config.skill_delay,
                });
                Vec::new()
            }
        }
    }

    /// Forecast from the current state to `target_time` without mutating it.
    #[must_use]
    pub fn forecast(&self, target_time: Fixed, config: &ForecastConfig) -> Forecast {
        run_forecast(&self.forecast_input(), target_time, config)
    }

    /// Read-only forecast input over the current state.
    #[must_use]
    pub fn forecast_input(&self) -> ForecastInput<'_> {
        ForecastInput {
            roster: &self.roster,
            grid: &self.grid,
            catalog: &self.catalog,
            ally_plans: &self.ally_plans,
            enemy_plans: &self.enemy_plans,
            pending_skills: &self.pending_skills,
            projectiles: &self.projectiles,
            start_time: self.elapsed,
        }
    }

    /// Deterministic hash of the roster, clock and in-flight effects.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.roster.state_hash().hash(&mut hasher);
        self.elapsed.to_bits().hash(&mut hasher);
        for projectile in &self.projectiles {
            projectile.target.hash(&mut hasher);
            projectile.position.hash(&mut hasher);
            projectile.damage.hash(&mut hasher);
        }
        for skill in &self.pending_skills {
            skill.name.hash(&mut hasher);
            skill.center.hash(&mut hasher);
            skill.remaining.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Win/loss state derived from the placed bases.
    #[must_use]
    pub fn outcome(&self) -> BattleOutcome {
        let standing = |team: Team| {
            let mut placed = false;
            let mut alive = false;
            for &(side, id) in &self.bases {
                if side == team {
                    placed = true;
                    alive |= self.roster.get(id).is_some_and(|e| e.active);
                }
            }
            !placed || alive
        };

        match (standing(Team::Ally), standing(Team::Enemy)) {
            (true, true) => BattleOutcome::InProgress,
            (true, false) => BattleOutcome::Victory(Team::Ally),
            (false, true) => BattleOutcome::Victory(Team::Enemy),
            (false, false) => BattleOutcome::Draw,
        }
    }
}

/// Resolve one fired attack. Ranged hostile attacks become projectiles.
fn resolve_fire(combat: &mut CombatContext<'_>, intent: FireIntent) -> Option<Projectile> {
    let roster = combat.roster();
    let attacker = roster.get(intent.attacker).filter(|e| e.active)?;
    let target = roster.get(intent.target).filter(|e| e.active)?;

    let hostile = attacker.team != target.team;
    let projectile = (hostile && attacker.stats.projectile).then(|| Projectile {
        attacker: intent.attacker,
        target: intent.target,
        position: attacker.position,
        speed: attacker.stats.projectile_speed,
        damage: attacker.stats.damage,
    });
    let damage = attacker.stats.damage;

    combat.break_stealth(intent.attacker);
    if projectile.is_none() {
        combat.apply_damage(Some(intent.attacker), intent.target, damage);
    }
    projectile
}

fn advance_projectiles(combat: &mut CombatContext<'_>, projectiles: &mut Vec<Projectile>, dt: Fixed) {
    let mut arrived = Vec::new();
    projectiles.retain_mut(|projectile| {
        let Some(target) = combat
            .roster()
            .get(projectile.target)
            .filter(|e| e.active)
        else {
            return false;
        };
        let step = projectile.speed * dt;
        if projectile.position.distance(target.position) <= step {
            arrived.push((projectile.attacker, projectile.target, projectile.damage));
            return false;
        }
        projectile.position = projectile.position.step_toward(target.position, step);
        true
    });

    for (attacker, target, damage) in arrived {
        combat.apply_damage(Some(attacker), target, damage);
    }
}

fn advance_skills(combat: &mut CombatContext<'_>, pending: &mut Vec<PendingSkill>, dt: Fixed) {
    let mut ready = Vec::new();
    pending.retain_mut(|skill| {
        skill.remaining -= dt;
        if skill.remaining <= Fixed::ZERO {
            ready.push(skill.clone());
            false
        } else {
            true
        }
    });

    for skill in ready {
        let hits = combat.apply_skill_effect(&skill.stats, skill.center, skill.affected_team);
        tracing::debug!(skill = %skill.name, hits = hits.len(), "Skill resolved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::NoHooks;
    use crate::data::{Trait, UnitStats};
    use crate::entity::CastState;
    use crate::grid::TileKind;
    use crate::status::CcKind;

    fn battle() -> Battle {
        let grid = BattleGrid::filled(40, 15, Fixed::from_num(20), TileKind::Neutral).unwrap();
        let mut catalog = Catalog::default();
        catalog.insert_unit(
            "soldier",
            UnitStats {
                cost: 2,
                hp: 50,
                damage: 10,
                range: Fixed::from_num(20),
                speed: Fixed::from_num(60),
                ..UnitStats::default()
            },
        );
        catalog.insert_unit(
            "archer",
            UnitStats {
                cost: 3,
                hp: 30,
                damage: 8,
                range: Fixed::from_num(150),
                speed: Fixed::from_num(40),
                projectile: true,
                ..UnitStats::default()
            },
        );
        let mut keep = UnitStats {
            hp: 500,
            ..UnitStats::default()
        };
        keep.traits.insert(Trait::Base);
        catalog.insert_unit("keep", keep);
        catalog.insert_skill(
            "fireball",
            SkillStats {
                cost: 3,
                radius: Fixed::from_num(60),
                damage: 20,
                ..SkillStats::default()
            },
        );
        catalog.insert_unit(
            "mage",
            UnitStats {
                cost: 4,
                hp: 40,
                damage: 30,
                range: Fixed::from_num(150),
                attack_speed: Fixed::from_num(2),
                speed: Fixed::from_num(40),
                cast_time: Some(Fixed::ONE),
                ..UnitStats::default()
            },
        );
        catalog.insert_skill(
            "daze",
            SkillStats {
                cost: 2,
                radius: Fixed::from_num(30),
                stun: Some(Fixed::ONE),
                ..SkillStats::default()
            },
        );
        Battle::new(grid, catalog, CcRuleTable::default(), BattleConfig::default())
    }

    fn secs(s: f64) -> Fixed {
        Fixed::from_num(s)
    }

    #[test]
    fn test_plans_execute_once_in_order() {
        let mut battle = battle();
        battle.add_plans(
            Team::Ally,
            [
                DeploymentPlan::unit("soldier", Team::Ally, Vec2Fixed::from_int(50, 50), secs(0.2)),
                DeploymentPlan::unit("soldier", Team::Ally, Vec2Fixed::from_int(50, 150), secs(0.1)),
            ],
        );
        let mut hooks = NoHooks;

        let first = battle.tick(secs(0.15), GameSpeed::Normal, &mut hooks);
        assert_eq!(first.spawned.len(), 1);
        assert_eq!(
            battle.roster().get(first.spawned[0]).unwrap().position,
            Vec2Fixed::from_int(50, 150)
        );

        let second = battle.tick(secs(0.15), GameSpeed::Normal, &mut hooks);
        assert_eq!(second.spawned.len(), 1);
        let third = battle.tick(secs(0.15), GameSpeed::Normal, &mut hooks);
        assert!(third.spawned.is_empty());
        assert!(battle.ally_plans().iter().all(|p| p.spawned));

        battle.start_round(&mut hooks);
        assert!(battle.ally_plans().is_empty());
        assert_eq!(battle.elapsed(), Fixed::ZERO);
    }

    #[test]
    fn test_unknown_plan_is_skipped() {
        let mut battle = battle();
        battle.add_plans(
            Team::Enemy,
            [DeploymentPlan::unit("dragon", Team::Enemy, Vec2Fixed::from_int(700, 50), secs(0.0))],
        );
        let report = battle.tick(secs(0.1), GameSpeed::Normal, &mut NoHooks);
        assert!(report.spawned.is_empty());
        assert!(battle.enemy_plans()[0].spawned);
    }

    #[test]
    fn test_paused_does_nothing() {
        let mut battle = battle();
        battle.add_plans(
            Team::Ally,
            [DeploymentPlan::unit("soldier", Team::Ally, Vec2Fixed::from_int(50, 50), secs(0.0))],
        );
        let report = battle.tick(secs(0.1), GameSpeed::Paused, &mut NoHooks);
        assert!(report.spawned.is_empty());
        assert_eq!(battle.elapsed(), Fixed::ZERO);
    }

    #[test]
    fn test_skill_resolves_after_delay() {
        let mut battle = battle();
        let target = battle
            .spawn_unit("soldier", Team::Enemy, Vec2Fixed::from_int(600, 250))
            .unwrap();
        battle.add_plans(
            Team::Ally,
            [DeploymentPlan::skill("fireball", Team::Ally, Vec2Fixed::from_int(600, 250), secs(0.0))],
        );
        let mut hooks = NoHooks;

        battle.tick(secs(0.1), GameSpeed::Normal, &mut hooks);
        battle.tick(secs(0.1), GameSpeed::Normal, &mut hooks);
        assert_eq!(battle.roster().get(target).unwrap().current_hp, 50);

        battle.tick(secs(0.25), GameSpeed::Normal, &mut hooks);
        assert_eq!(battle.roster().get(target).unwrap().current_hp, 30);
    }

    #[test]
    fn test_forecast_counts_skill_already_cast() {
        let mut battle = battle();
        let target = battle
            .spawn_unit("soldier", Team::Enemy, Vec2Fixed::from_int(600, 250))
            .unwrap();
        battle.add_plans(
            Team::Ally,
            [DeploymentPlan::skill("fireball", Team::Ally, Vec2Fixed::from_int(600, 250), secs(0.0))],
        );

        battle.tick(secs(0.1), GameSpeed::Normal, &mut NoHooks);
        assert!(battle.ally_plans()[0].spawned);
        assert_eq!(battle.pending_skills().len(), 1);

        let forecast = battle.forecast(battle.elapsed() + secs(1.0), &ForecastConfig::default());
        assert_eq!(forecast.ghosts[0].current_hp, 30);
        assert_eq!(battle.pending_skills().len(), 1);
        assert_eq!(battle.roster().get(target).unwrap().current_hp, 50);
    }

    #[test]
    fn test_ranged_attack_travels_as_projectile() {
        let mut battle = battle();
        battle
            .spawn_unit("archer", Team::Ally, Vec2Fixed::from_int(100, 100))
            .unwrap();
        let target = battle
            .spawn_unit("soldier", Team::Enemy, Vec2Fixed::from_int(220, 100))
            .unwrap();
        let mut hooks = NoHooks;

        battle.tick(secs(0.1), GameSpeed::Normal, &mut hooks);
        assert_eq!(battle.projectiles().len(), 1);
        assert_eq!(battle.roster().get(target).unwrap().current_hp, 50);

        for _ in 0..5 {
            battle.tick(secs(0.1), GameSpeed::Normal, &mut hooks);
        }
        assert!(battle.projectiles().is_empty());
        assert!(battle.roster().get(target).unwrap().current_hp < 50);
    }

    #[test]
    fn test_melee_fight_to_the_death() {
        let mut battle = battle();
        battle
            .spawn_unit("soldier", Team::Ally, Vec2Fixed::from_int(100, 100))
            .unwrap();
        let victim = battle
            .spawn_unit("soldier", Team::Enemy, Vec2Fixed::from_int(110, 100))
            .unwrap();
        battle.roster_mut().get_mut(victim).unwrap().current_hp = 10;

        let report = battle.tick(secs(0.1), GameSpeed::Normal, &mut NoHooks);
        assert_eq!(report.removed, vec![victim]);
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::Died { id, .. } if *id == victim)));
        assert!(battle.roster().get(victim).is_none());
    }

    #[test]
    fn test_shot_at_a_target_killed_this_tick_is_dropped() {
        let mut battle = battle();
        battle
            .spawn_unit("soldier", Team::Ally, Vec2Fixed::from_int(100, 100))
            .unwrap();
        battle
            .spawn_unit("soldier", Team::Ally, Vec2Fixed::from_int(100, 115))
            .unwrap();
        let victim = battle
            .spawn_unit("soldier", Team::Enemy, Vec2Fixed::from_int(115, 108))
            .unwrap();
        battle.roster_mut().get_mut(victim).unwrap().current_hp = 1;

        let report = battle.tick(secs(0.1), GameSpeed::Normal, &mut NoHooks);
        let hits = report
            .events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Damaged { target, .. } if *target == victim))
            .count();
        let deaths = report
            .events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Died { .. }))
            .count();
        assert_eq!(hits, 1);
        assert_eq!(deaths, 1);
        assert_eq!(report.removed, vec![victim]);
    }

    #[test]
    fn test_stun_interrupts_cast_in_flight() {
        let mut battle = battle();
        let mage = battle
            .spawn_unit("mage", Team::Ally, Vec2Fixed::from_int(100, 100))
            .unwrap();
        let target = battle
            .spawn_unit("soldier", Team::Enemy, Vec2Fixed::from_int(200, 100))
            .unwrap();
        battle.add_plans(
            Team::Enemy,
            [DeploymentPlan::skill("daze", Team::Enemy, Vec2Fixed::from_int(100, 100), secs(0.0))],
        );
        let mut hooks = NoHooks;

        for _ in 0..10 {
            battle.tick(secs(0.1), GameSpeed::Normal, &mut hooks);
            if battle.roster().get(mage).unwrap().status.is_active(CcKind::Stun) {
                break;
            }
        }
        let caster = battle.roster().get(mage).unwrap();
        assert!(caster.status.is_active(CcKind::Stun));
        assert!(caster.cast.is_casting());

        battle.tick(secs(0.1), GameSpeed::Normal, &mut hooks);
        let caster = battle.roster().get(mage).unwrap();
        assert_eq!(caster.cast, CastState::Idle);
        assert_eq!(caster.attack_cooldown, battle.config().cast_cancel_penalty);
        assert_eq!(battle.roster().get(target).unwrap().current_hp, 50);
    }

    #[test]
    fn test_outcome_tracks_bases() {
        let mut battle = battle();
        assert_eq!(battle.outcome(), BattleOutcome::InProgress);

        battle.place_base("keep", Team::Ally, Vec2Fixed::from_int(20, 150)).unwrap();
        let enemy_keep = battle
            .place_base("keep", Team::Enemy, Vec2Fixed::from_int(780, 150))
            .unwrap();
        assert_eq!(battle.outcome(), BattleOutcome::InProgress);
        assert!(battle.place_base("castle", Team::Enemy, Vec2Fixed::ZERO).is_err());

        battle.roster_mut().get_mut(enemy_keep).unwrap().active = false;
        assert_eq!(battle.outcome(), BattleOutcome::Victory(Team::Ally));
    }

    #[test]
    fn test_forecast_leaves_live_state_untouched() {
        let mut battle = battle();
        battle
            .spawn_unit("soldier", Team::Ally, Vec2Fixed::from_int(100, 100))
            .unwrap();
        battle
            .spawn_unit("soldier", Team::Enemy, Vec2Fixed::from_int(300, 100))
            .unwrap();
        let before = battle.roster().to_bytes().unwrap();

        let forecast = battle.forecast(secs(5.0), &ForecastConfig::default());
        assert_eq!(forecast.steps, 50);
        assert_eq!(battle.roster().to_bytes().unwrap(), before);
    }
}
