//! Per-tick attack-or-move decision for live entities.
//!
//! Every entity reads other entities through a [`TargetView`] captured at
//! the start of the tick, so no update observes another entity's
//! half-applied state. Attacks are returned as [`FireIntent`]s and resolved
//! by the battle loop after all updates have run.

use crate::casting::{self, AttackStep};
use crate::config::BattleConfig;
use crate::entity::{Entity, EntityId, Roster, Team};
use crate::grid::BattleGrid;
use crate::math::{Fixed, Vec2Fixed};
use crate::pathfinding::{PathMode, PathSearch, SearchStatus};
use crate::rules::{self, Combatant, DistanceMetric};
use crate::status::CcRuleTable;

/// Combat-relevant copy of an entity taken at tick start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetInfo {
    team: Team,
    position: Vec2Fixed,
    active: bool,
    visible: bool,
    base: bool,
    hp: i32,
    max_hp: i32,
}

impl Combatant for TargetInfo {
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
        self.visible
    }

    fn is_base(&self) -> bool {
        self.base
    }

    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.max_hp
    }
}

/// The roster as it stood at tick start.
#[derive(Debug, Clone, Default)]
pub struct TargetView {
    entries: Vec<(EntityId, TargetInfo)>,
}

impl TargetView {
    /// Snapshot every occupied slot.
    #[must_use]
    pub fn capture(roster: &Roster) -> Self {
        let entries = roster
            .iter()
            .map(|(id, e)| {
                let info = TargetInfo {
                    team: e.team,
                    position: e.position,
                    active: e.active,
                    visible: Combatant::is_visible(e),
                    base: e.is_base(),
                    hp: e.current_hp,
                    max_hp: e.stats.hp,
                };
                (id, info)
            })
            .collect();
        Self { entries }
    }

    /// Snapshot entry for a handle.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&TargetInfo> {
        self.entries
            .binary_search_by_key(&id, |(k, _)| *k)
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Entries in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &TargetInfo)> {
        self.entries.iter().map(|(id, info)| (*id, info))
    }
}

/// An attack that fired this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireIntent {
    /// Firing entity.
    pub attacker: EntityId,
    /// Intended target; re-checked before resolution.
    pub target: EntityId,
}

/// Outcome of one entity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitUpdate {
    /// Attack to resolve after the update phase.
    pub fire: Option<FireIntent>,
    /// A new path search was started.
    pub requested_path: bool,
}

/// Shared inputs for entity updates within one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Tick-start snapshot.
    pub view: &'a TargetView,
    /// Walkability.
    pub grid: &'a BattleGrid,
    /// Crowd-control rules.
    pub cc_rules: &'a CcRuleTable,
    /// Tuning.
    pub config: &'a BattleConfig,
    /// Simulated seconds this tick.
    pub dt: Fixed,
}

/// Advance one live entity by one tick.
pub fn update_entity(id: EntityId, entity: &mut Entity, ctx: &TickContext<'_>) -> UnitUpdate {
    let mut update = UnitUpdate::default();
    if !entity.active || entity.is_base() {
        return update;
    }

    let dt = ctx.dt;
    entity.attack_cooldown = (entity.attack_cooldown - dt).max(Fixed::ZERO);
    entity.path_timer = (entity.path_timer - dt).max(Fixed::ZERO);
    entity.status.tick(dt);

    if !entity.is_spawned {
        entity.spawn_timer -= dt;
        if entity.spawn_timer > Fixed::ZERO {
            return update;
        }
        entity.spawn_timer = Fixed::ZERO;
        entity.is_spawned = true;
    }

    let control = entity.status.control(ctx.cc_rules);

    if let AttackStep::Fired(target) =
        casting::advance_cast(entity, dt, control, ctx.config.cast_cancel_penalty)
    {
        update.fire = Some(FireIntent {
            attacker: id,
            target,
        });
    }
    if entity.cast.is_casting() {
        return update;
    }

    let found = if entity.is_healer() {
        rules::nearest_injured_ally(ctx.view.iter(), entity.team, entity.position, &id)
    } else {
        rules::nearest_hostile(
            ctx.view.iter(),
            entity.team,
            entity.position,
            DistanceMetric::Euclidean,
        )
    };
    let Some((target_id, distance)) = found else {
        return update;
    };
    let Some(target_pos) = ctx.view.get(target_id).map(|t| t.position) else {
        return update;
    };

    if distance <= entity.stats.range {
        entity.clear_path();
        entity.face(target_pos);
        if control.can_attack {
            if let AttackStep::Fired(target) = casting::try_attack(entity, target_id) {
                update.fire = Some(FireIntent {
                    attacker: id,
                    target,
                });
            }
        }
        return update;
    }

    if !control.can_move {
        return update;
    }

    // An in-flight search keeps its budget across replans until it settles.
    if entity.path_timer <= Fixed::ZERO {
        if entity.path_search.is_none() {
            update.requested_path = request_path(entity, target_pos, ctx);
        }
        entity.path_timer = ctx.config.replan_interval;
    }
    advance_search(entity, target_pos, ctx);
    follow_path(entity, ctx.config.waypoint_tolerance, dt);

    update
}

fn request_path(entity: &mut Entity, target_pos: Vec2Fixed, ctx: &TickContext<'_>) -> bool {
    let grid = ctx.grid;
    let (Some(start), Some(goal)) = (
        grid.world_to_tile(grid.clamp_to_field(entity.position)),
        grid.world_to_tile(grid.clamp_to_field(target_pos)),
    ) else {
        return false;
    };
    entity.path_search = Some(PathSearch::new(grid, start, goal));
    true
}

fn advance_search(entity: &mut Entity, target_pos: Vec2Fixed, ctx: &TickContext<'_>) {
    let Some(search) = entity.path_search.as_mut() else {
        return;
    };

    let mode = PathMode::Bounded {
        nodes_per_frame: ctx.config.path_nodes_per_frame,
    };
    let target_tile = ctx.grid.world_to_tile(target_pos);
    let goal = search.goal();

    match search.advance(ctx.grid, mode) {
        SearchStatus::Pending => {}
        SearchStatus::Found(mut path) => {
            if target_tile == Some(goal) {
                if let Some(last) = path.last_mut() {
                    *last = target_pos;
                }
            }
            entity.path = path.into();
            entity.path_search = None;
        }
        SearchStatus::Failed => {
            tracing::debug!(unit = %entity.name, "No route to target");
            entity.clear_path();
        }
    }
}

fn follow_path(entity: &mut Entity, tolerance: Fixed, dt: Fixed) {
    while entity
        .path
        .front()
        .is_some_and(|wp| entity.position.distance(*wp) <= tolerance)
    {
        entity.path.pop_front();
    }

    let Some(&waypoint) = entity.path.front() else {
        return;
    };

    entity.face(waypoint);
    entity.position = entity
        .position
        .step_toward(waypoint, entity.stats.speed * dt);

    if entity.position.distance(waypoint) <= tolerance {
        entity.path.pop_front();
    }
}

/// Push overlapping same-team entities apart.
///
/// Pushes are computed from positions at call time and applied only when
/// the destination stays walkable. Bases and movement-locked entities are
/// never pushed.
pub fn apply_separation(
    roster: &mut Roster,
    grid: &BattleGrid,
    cc_rules: &CcRuleTable,
    config: &BattleConfig,
    dt: Fixed,
) {
    let radius = config.separation_radius;
    if radius <= Fixed::ZERO {
        return;
    }

    let movers: Vec<(EntityId, Team, Vec2Fixed)> = roster
        .iter()
        .filter(|(_, e)| e.active && !e.is_base())
        .map(|(id, e)| (id, e.team, e.position))
        .collect();

    let mut pushes = vec![Vec2Fixed::ZERO; movers.len()];
    for i in 0..movers.len() {
        for j in (i + 1)..movers.len() {
            let (_, team_a, pos_a) = movers[i];
            let (_, team_b, pos_b) = movers[j];
            if team_a != team_b {
                continue;
            }

            let distance = pos_a.distance(pos_b);
            if distance >= radius {
                continue;
            }

            let overlap = (radius - distance) / radius;
            let magnitude = config.separation_force * overlap * dt;
            // Coincident entities separate along X by roster order.
            let dir = if distance == Fixed::ZERO {
                Vec2Fixed::new(Fixed::ONE, Fixed::ZERO)
            } else {
                (pos_b - pos_a).normalize()
            };

            pushes[i] = pushes[i] - dir.scale(magnitude);
            pushes[j] += dir.scale(magnitude);
        }
    }

    for ((id, _, _), push) in movers.into_iter().zip(pushes) {
        if push == Vec2Fixed::ZERO {
            continue;
        }
        let Some(entity) = roster.get_mut(id) else {
            continue;
        };
        if !entity.status.control(cc_rules).can_move {
            continue;
        }
        let destination = entity.position + push;
        if grid.is_walkable_at(destination) {
            entity.position = destination;
        }
    }
}
