//! Live entity records and the roster arena that owns them.
//!
//! Entities are addressed by generational [`EntityId`] handles. The
//! post-tick sweep empties a dead entity's slot and bumps its generation, so
//! the slot can be reused by a later deployment while a stale handle simply
//! resolves to `None`.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::data::{Trait, UnitStats};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::pathfinding::PathSearch;
use crate::status::StatusEffects;

/// Generational handle into a [`Roster`].
///
/// Ordered by slot index first, which is roster iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Handle for `index` at `generation`.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Times the slot had been vacated when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Side of the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// Player side, deploys from the left edge.
    Ally,
    /// Opponent side, deploys from the right edge.
    Enemy,
}

impl Team {
    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Ally => Self::Enemy,
            Self::Enemy => Self::Ally,
        }
    }

    /// Sign of the X axis this team advances along.
    #[must_use]
    pub fn forward_sign(self) -> Fixed {
        match self {
            Self::Ally => Fixed::ONE,
            Self::Enemy => -Fixed::ONE,
        }
    }

    /// Infer the team owning a spawn point from the field half it lies in.
    #[must_use]
    pub fn from_field_half(x: Fixed, field_width: Fixed) -> Self {
        if x < field_width / Fixed::from_num(2) {
            Self::Ally
        } else {
            Self::Enemy
        }
    }
}

/// Attack state machine: Idle -> Casting -> Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CastState {
    /// Ready to start an attack once the cooldown allows it.
    #[default]
    Idle,
    /// Winding up an attack on `target`.
    Casting {
        /// Seconds until the attack fires.
        #[serde(with = "fixed_serde")]
        remaining: Fixed,
        /// Entity the attack was started against.
        target: EntityId,
    },
}

impl CastState {
    /// Returns true while winding up.
    #[must_use]
    pub const fn is_casting(&self) -> bool {
        matches!(self, Self::Casting { .. })
    }
}

/// A deployed unit, structure or base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Template name.
    pub name: String,
    /// Owning side.
    pub team: Team,
    /// World position.
    pub position: Vec2Fixed,
    /// Stats snapshot taken at spawn.
    pub stats: UnitStats,
    /// Current hit points, always within `0..=stats.hp`.
    pub current_hp: i32,
    /// False once dead; the slot is emptied in the next sweep.
    pub active: bool,
    /// False during the spawn grace period.
    pub is_spawned: bool,
    /// Hidden from hostile targeting until revealed.
    pub is_stealthed: bool,
    /// Seconds until the next attack may start.
    #[serde(with = "fixed_serde")]
    pub attack_cooldown: Fixed,
    /// Casting progress.
    pub cast: CastState,
    /// Active crowd control.
    pub status: StatusEffects,
    /// Waypoints still to visit.
    pub path: VecDeque<Vec2Fixed>,
    /// Seconds until a new path may be requested.
    #[serde(with = "fixed_serde")]
    pub path_timer: Fixed,
    /// Bounded search carried across frames.
    #[serde(skip)]
    pub path_search: Option<PathSearch>,
    /// Seconds of spawn grace remaining.
    #[serde(with = "fixed_serde")]
    pub spawn_timer: Fixed,
    /// Unit vector of the last facing direction.
    pub facing: Vec2Fixed,
    /// Kills credited to this entity.
    pub kills: u32,
}

impl Entity {
    /// Create a freshly deployed entity with full hp and zero cooldowns.
    #[must_use]
    pub fn spawn(
        name: impl Into<String>,
        team: Team,
        position: Vec2Fixed,
        stats: UnitStats,
        spawn_grace: Fixed,
    ) -> Self {
        let is_stealthed = stats.has_trait(Trait::Stealth);
        let current_hp = stats.hp;
        Self {
            name: name.into(),
            team,
            position,
            stats,
            current_hp,
            active: true,
            is_spawned: spawn_grace <= Fixed::ZERO,
            is_stealthed,
            attack_cooldown: Fixed::ZERO,
            cast: CastState::Idle,
            status: StatusEffects::default(),
            path: VecDeque::new(),
            path_timer: Fixed::ZERO,
            path_search: None,
            spawn_timer: spawn_grace.max(Fixed::ZERO),
            facing: Vec2Fixed::new(team.forward_sign(), Fixed::ZERO),
            kills: 0,
        }
    }

    /// Bases never move or act and use contact distance when targeted.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.stats.has_trait(Trait::Base)
    }

    /// Healers carry negative damage.
    #[must_use]
    pub fn is_healer(&self) -> bool {
        self.stats.damage < 0
    }

    /// Alive, spawned and not hidden: eligible as a hostile target.
    #[must_use]
    pub fn is_targetable(&self) -> bool {
        self.active && self.is_spawned && !self.is_stealthed
    }

    /// Drop any route and in-flight search.
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.path_search = None;
    }

    /// Face toward `point` if it differs from the current position.
    pub fn face(&mut self, point: Vec2Fixed) {
        let dir = (point - self.position).normalize();
        if dir != Vec2Fixed::ZERO {
            self.facing = dir;
        }
    }

    fn hash_into(&self, hasher: &mut DefaultHasher) {
        self.name.hash(hasher);
        self.team.hash(hasher);
        self.position.hash(hasher);
        self.current_hp.hash(hasher);
        self.active.hash(hasher);
        self.is_spawned.hash(hasher);
        self.is_stealthed.hash(hasher);
        self.attack_cooldown.to_bits().hash(hasher);
        self.cast.is_casting().hash(hasher);
        self.status.hash_into(hasher);
        self.kills.hash(hasher);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Arena of live entities.
///
/// Vacated slots are reused lowest index first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    slots: Vec<Slot>,
    /// Vacant slot indices, highest first so `pop` yields the lowest.
    free: Vec<u32>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity and return its handle.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.entity = Some(entity);
                return EntityId::new(index, slot.generation);
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entity: Some(entity),
        });
        EntityId::new(index, 0)
    }

    fn slot(&self, id: EntityId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slot(id).and_then(|slot| slot.entity.as_ref())
    }

    /// Look up an entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    /// Look up an entity, failing if the handle is stale.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if the slot is empty or reused.
    pub fn try_get(&self, id: EntityId) -> Result<&Entity> {
        self.get(id).ok_or(GameError::EntityNotFound(id))
    }

    /// Iterate occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.entity
                .as_ref()
                .map(|e| (EntityId::new(i as u32, slot.generation), e))
        })
    }

    /// Handles of occupied slots in index order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns true if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots allocated so far, occupied or vacant.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Count active entities of a team, optionally excluding bases.
    #[must_use]
    pub fn count_active(&self, team: Team, include_bases: bool) -> usize {
        self.iter()
            .filter(|(_, e)| e.active && e.team == team && (include_bases || !e.is_base()))
            .count()
    }

    /// Empty the slots of inactive entities and return their handles.
    pub fn sweep_dead(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.entity.as_ref().is_some_and(|e| !e.active) {
                removed.push(EntityId::new(i as u32, slot.generation));
                slot.entity = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
            }
        }
        if !removed.is_empty() {
            self.free.sort_unstable_by(|a, b| b.cmp(a));
        }
        removed
    }

    /// Deterministic hash of every occupied slot.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.slots.len().hash(&mut hasher);
        for (id, entity) in self.iter() {
            id.hash(&mut hasher);
            entity.hash_into(&mut hasher);
        }
        hasher.finish()
    }

    /// Serialize the roster to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize roster: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hp: i32) -> UnitStats {
        UnitStats {
            hp,
            ..UnitStats::default()
        }
    }

    #[test]
    fn test_team_helpers() {
        assert_eq!(Team::Ally.opponent(), Team::Enemy);
        assert_eq!(Team::Enemy.forward_sign(), -Fixed::ONE);

        let width = Fixed::from_num(800);
        assert_eq!(Team::from_field_half(Fixed::from_num(100), width), Team::Ally);
        assert_eq!(Team::from_field_half(Fixed::from_num(400), width), Team::Enemy);
    }

    #[test]
    fn test_spawn_starts_full() {
        let entity = Entity::spawn("grunt", Team::Ally, Vec2Fixed::ZERO, stats(70), Fixed::ZERO);
        assert_eq!(entity.current_hp, 70);
        assert!(entity.active);
        assert!(entity.is_spawned);
        assert_eq!(entity.attack_cooldown, Fixed::ZERO);
        assert!(!entity.cast.is_casting());
    }

    #[test]
    fn test_spawn_grace_hides_from_targeting() {
        let entity = Entity::spawn("grunt", Team::Ally, Vec2Fixed::ZERO, stats(10), Fixed::ONE);
        assert!(!entity.is_spawned);
        assert!(!entity.is_targetable());
    }

    #[test]
    fn test_handles_survive_sweep() {
        let mut roster = Roster::new();
        let a = roster.insert(Entity::spawn("a", Team::Ally, Vec2Fixed::ZERO, stats(5), Fixed::ZERO));
        let b = roster.insert(Entity::spawn("b", Team::Enemy, Vec2Fixed::ZERO, stats(5), Fixed::ZERO));

        roster.get_mut(a).unwrap().active = false;
        assert_eq!(roster.sweep_dead(), vec![a]);

        assert!(roster.get(a).is_none());
        assert!(matches!(roster.try_get(a), Err(GameError::EntityNotFound(id)) if id == a));
        assert_eq!(roster.get(b).unwrap().name, "b");

        let c = roster.insert(Entity::spawn("c", Team::Ally, Vec2Fixed::ZERO, stats(5), Fixed::ZERO));
        assert_ne!(c, a);
        assert_eq!(c.index(), a.index());
        assert!(roster.get(a).is_none());
        assert_eq!(roster.get(c).unwrap().name, "c");
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_slots_are_reused_across_rounds() {
        let mut roster = Roster::new();
        let keep = roster.insert(Entity::spawn("keep", Team::Ally, Vec2Fixed::ZERO, stats(50), Fixed::ZERO));

        for _ in 0..20 {
            let wave: Vec<EntityId> = (0..5)
                .map(|_| roster.insert(Entity::spawn("grunt", Team::Enemy, Vec2Fixed::ZERO, stats(5), Fixed::ZERO)))
                .collect();
            for &id in &wave {
                roster.get_mut(id).unwrap().active = false;
            }
            assert_eq!(roster.sweep_dead(), wave);
        }

        assert_eq!(roster.capacity(), 6);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.ids(), vec![keep]);
    }

    #[test]
    fn test_reuse_takes_lowest_vacant_slot() {
        let mut roster = Roster::new();
        let ids: Vec<EntityId> = (0..4)
            .map(|_| roster.insert(Entity::spawn("g", Team::Ally, Vec2Fixed::ZERO, stats(5), Fixed::ZERO)))
            .collect();
        roster.get_mut(ids[3]).unwrap().active = false;
        roster.get_mut(ids[1]).unwrap().active = false;
        roster.sweep_dead();

        let next = roster.insert(Entity::spawn("n", Team::Ally, Vec2Fixed::ZERO, stats(5), Fixed::ZERO));
        assert_eq!(next, EntityId::new(1, 1));
        let after = roster.insert(Entity::spawn("m", Team::Ally, Vec2Fixed::ZERO, stats(5), Fixed::ZERO));
        assert_eq!(after, EntityId::new(3, 1));
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut roster = Roster::new();
        let id = roster.insert(Entity::spawn("a", Team::Ally, Vec2Fixed::ZERO, stats(5), Fixed::ZERO));
        let before = roster.state_hash();
        assert_eq!(before, roster.clone().state_hash());

        roster.get_mut(id).unwrap().current_hp = 4;
        assert_ne!(before, roster.state_hash());
    }
}
