//! Live combat resolution: damage, healing, death, skills and crowd control.
//!
//! # Hooks
//!
//! External progression systems observe combat through [`CombatHooks`].
//! Hooks never mutate the roster directly; they return [`HookCommand`]s that
//! are executed through the same resolution path as ordinary attacks:
//!
//! - damage -> `on_deal_damage` -> more damage (possibly recursive)
//! - death -> `on_unit_death` -> damage elsewhere, cost refunds
//!
//! Commands are drained from a FIFO work queue. Every top-level action has a
//! command budget ([`BattleConfig::max_hook_commands`]) so a cascade of hooks
//! that keep triggering each other terminates.

use std::collections::VecDeque;

use crate::config::BattleConfig;
use crate::data::SkillStats;
use crate::entity::{Entity, EntityId, Roster, Team};
use crate::grid::BattleGrid;
use crate::math::{Fixed, Vec2Fixed};
use crate::rules;
use crate::status::CcKind;

/// Mutation requested by a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCommand {
    /// Apply `amount` to `target` (negative heals).
    DealDamage {
        /// Entity credited with the damage, if any.
        source: Option<EntityId>,
        /// Entity receiving the damage.
        target: EntityId,
        /// Signed amount.
        amount: i32,
    },
    /// Change the deploying player's available cost.
    AdjustCost(i32),
}

/// Callbacks consumed by external progression systems.
///
/// Every method defaults to doing nothing.
pub trait CombatHooks {
    /// An entity died.
    fn on_unit_death(&mut self, _id: EntityId, _entity: &Entity) -> Vec<HookCommand> {
        Vec::new()
    }

    /// Damage landed on `target`.
    fn on_deal_damage(
        &mut self,
        _attacker: Option<EntityId>,
        _target: EntityId,
        _amount: i32,
    ) -> Vec<HookCommand> {
        Vec::new()
    }

    /// A new round begins.
    fn on_round_start(&mut self) -> Vec<HookCommand> {
        Vec::new()
    }
}

/// Hooks that never react.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl CombatHooks for NoHooks {}

/// Observable result of combat resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEvent {
    /// Hp was lost.
    Damaged {
        /// Credited entity.
        attacker: Option<EntityId>,
        /// Damaged entity.
        target: EntityId,
        /// Hp actually removed.
        amount: i32,
        /// Above the critical threshold; presentation only.
        critical: bool,
    },
    /// Hp was restored.
    Healed {
        /// Healing entity, if any.
        source: Option<EntityId>,
        /// Healed entity.
        target: EntityId,
        /// Hp actually restored.
        amount: i32,
    },
    /// An entity died.
    Died {
        /// Dead entity.
        id: EntityId,
        /// Credited entity.
        killer: Option<EntityId>,
    },
    /// Crowd control applied.
    CcApplied {
        /// Affected entity.
        target: EntityId,
        /// Kind of effect.
        kind: CcKind,
    },
    /// Entity displaced by knockback.
    KnockedBack {
        /// Displaced entity.
        target: EntityId,
        /// New position.
        to: Vec2Fixed,
    },
    /// Stealth removed.
    StealthBroken {
        /// Revealed entity.
        target: EntityId,
    },
    /// Cost adjusted by a hook.
    CostAdjusted(i32),
}

/// Mutable combat state for one resolution phase.
pub struct CombatContext<'a> {
    roster: &'a mut Roster,
    grid: &'a BattleGrid,
    config: &'a BattleConfig,
    hooks: &'a mut dyn CombatHooks,
    /// Events produced so far.
    pub events: Vec<CombatEvent>,
    /// Net cost change requested by hooks.
    pub cost_delta: i32,
}

impl<'a> CombatContext<'a> {
    /// Create a context over the live roster.
    pub fn new(
        roster: &'a mut Roster,
        grid: &'a BattleGrid,
        config: &'a BattleConfig,
        hooks: &'a mut dyn CombatHooks,
    ) -> Self {
        Self {
            roster,
            grid,
            config,
            hooks,
            events: Vec::new(),
            cost_delta: 0,
        }
    }

    /// Read access to the roster.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        self.roster
    }

    /// Apply damage (positive) or healing (negative) from `attacker`.
    ///
    /// No-op if the target is gone, inactive or already at zero hp.
    pub fn apply_damage(&mut self, attacker: Option<EntityId>, target: EntityId, amount: i32) {
        self.run_commands(vec![HookCommand::DealDamage {
            source: attacker,
            target,
            amount,
        }]);
    }

    /// Fire the round-start hook and execute what it returns.
    pub fn round_start(&mut self) {
        let commands = self.hooks.on_round_start();
        self.run_commands(commands);
    }

    /// Apply crowd control; the remaining time becomes the longer of the two.
    pub fn apply_cc(&mut self, target: EntityId, kind: CcKind, duration: Fixed) {
        let Some(entity) = self.roster.get_mut(target) else {
            return;
        };
        if !entity.active {
            return;
        }
        entity.status.apply(kind, duration);
        self.events.push(CombatEvent::CcApplied { target, kind });
    }

    /// Resolve a skill impact at `center` against `affected_team`.
    ///
    /// Returns the handles that were hit.
    pub fn apply_skill_effect(
        &mut self,
        skill: &SkillStats,
        center: Vec2Fixed,
        affected_team: Team,
    ) -> Vec<EntityId> {
        let hits = rules::area_targets(
            self.roster.iter(),
            center,
            skill.radius,
            affected_team,
            skill.friendly_fire,
        );

        for &id in &hits {
            if skill.damage > 0 {
                self.apply_damage(None, id, skill.damage);
            }
            if skill.shield > 0 {
                self.apply_damage(None, id, -skill.shield);
            }
            if let Some(stun) = skill.stun {
                self.apply_cc(id, CcKind::Stun, stun);
            }
            for (&kind, &duration) in &skill.cc {
                self.apply_cc(id, kind, duration);
                if kind.is_knockback() {
                    self.knockback(id, center);
                }
            }
            self.break_stealth(id);
        }

        hits
    }

    /// Clear stealth on an entity.
    pub fn break_stealth(&mut self, target: EntityId) {
        if let Some(entity) = self.roster.get_mut(target) {
            if entity.is_stealthed {
                entity.is_stealthed = false;
                self.events.push(CombatEvent::StealthBroken { target });
            }
        }
    }

    /// Push `target` directly away from `center` if the destination is walkable.
    fn knockback(&mut self, target: EntityId, center: Vec2Fixed) {
        let Some(entity) = self.roster.get_mut(target) else {
            return;
        };
        if !entity.active || entity.is_base() {
            return;
        }

        let mut dir = (entity.position - center).normalize();
        if dir == Vec2Fixed::ZERO {
            dir = Vec2Fixed::new(-entity.team.forward_sign(), Fixed::ZERO);
        }
        let destination = entity.position + dir.scale(self.config.knockback_distance);
        if self.grid.is_walkable_at(destination) {
            entity.position = destination;
            entity.clear_path();
            self.events.push(CombatEvent::KnockedBack {
                target,
                to: destination,
            });
        }
    }

    fn run_commands(&mut self, initial: Vec<HookCommand>) {
        let mut queue: VecDeque<HookCommand> = initial.into();
        let mut executed = 0usize;

        while let Some(command) = queue.pop_front() {
            if executed >= self.config.max_hook_commands {
                tracing::warn!(
                    dropped = queue.len() + 1,
                    limit = self.config.max_hook_commands,
                    "Hook cascade exceeded command limit"
                );
                break;
            }
            executed += 1;
            queue.extend(self.execute(command));
        }
    }

    fn execute(&mut self, command: HookCommand) -> Vec<HookCommand> {
        match command {
            HookCommand::DealDamage {
                source,
                target,
                amount,
            } => self.resolve_damage(source, target, amount),
            HookCommand::AdjustCost(delta) => {
                self.cost_delta += delta;
                self.events.push(CombatEvent::CostAdjusted(delta));
                Vec::new()
            }
        }
    }

    fn resolve_damage(
        &mut self,
        attacker: Option<EntityId>,
        target: EntityId,
        amount: i32,
    ) -> Vec<HookCommand> {
        let Some(entity) = self.roster.get_mut(target) else {
            return Vec::new();
        };
        let max_hp = entity.stats.hp;
        let outcome = rules::apply_hp_delta(
            &mut entity.current_hp,
            &mut entity.active,
            max_hp,
            amount,
            self.config.crit_threshold,
        );

        let mut follow_up = Vec::new();
        if outcome.applied > 0 {
            self.events.push(CombatEvent::Damaged {
                attacker,
                target,
                amount: outcome.applied,
                critical: outcome.critical,
            });
            follow_up.extend(self.hooks.on_deal_damage(attacker, target, outcome.applied));
        } else if outcome.applied < 0 {
            self.events.push(CombatEvent::Healed {
                source: attacker,
                target,
                amount: -outcome.applied,
            });
        }

        if outcome.killed {
            if let Some(killer) = attacker.and_then(|id| self.roster.get_mut(id)) {
                killer.kills += 1;
            }
            self.events.push(CombatEvent::Died {
                id: target,
                killer: attacker,
            });
            if let Some(dead) = self.roster.get(target) {
                tracing::debug!(unit = %dead.name, "Unit died");
                follow_up.extend(self.hooks.on_unit_death(target, dead));
            }
        }

        follow_up
    }
}
