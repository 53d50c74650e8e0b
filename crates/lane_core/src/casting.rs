//! Attack wind-up state machine.
//!
//! `Idle -> Casting -> (Fire | Cancelled) -> Idle`. Units without a cast
//! time skip straight from `Idle` to firing.

use crate::entity::{CastState, Entity, EntityId};
use crate::math::Fixed;
use crate::status::ControlState;

/// What a state machine step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStep {
    /// Nothing happened.
    None,
    /// A wind-up began.
    Started,
    /// The attack fires at the given target.
    Fired(EntityId),
    /// Crowd control interrupted the wind-up.
    Cancelled,
}

/// Begin an attack on `target`.
///
/// No-op while on cooldown or already casting.
pub fn try_attack(entity: &mut Entity, target: EntityId) -> AttackStep {
    if entity.attack_cooldown > Fixed::ZERO || entity.cast.is_casting() {
        return AttackStep::None;
    }

    let cast_time = entity.stats.cast_time();
    if cast_time <= Fixed::ZERO {
        entity.attack_cooldown = entity.stats.attack_speed;
        return AttackStep::Fired(target);
    }

    entity.cast = CastState::Casting {
        remaining: cast_time,
        target,
    };
    AttackStep::Started
}

/// Progress an in-flight cast by `dt`.
///
/// An active cancelling effect aborts the cast and applies `cancel_penalty`
/// as cooldown instead of a full attack cycle.
pub fn advance_cast(
    entity: &mut Entity,
    dt: Fixed,
    control: ControlState,
    cancel_penalty: Fixed,
) -> AttackStep {
    let CastState::Casting { remaining, target } = entity.cast else {
        return AttackStep::None;
    };

    if control.cancel_cast {
        entity.cast = CastState::Idle;
        entity.attack_cooldown = cancel_penalty;
        tracing::debug!(unit = %entity.name, "Cast interrupted");
        return AttackStep::Cancelled;
    }

    let remaining = remaining - dt;
    if remaining <= Fixed::ZERO {
        entity.cast = CastState::Idle;
        entity.attack_cooldown = entity.stats.attack_speed;
        AttackStep::Fired(target)
    } else {
        entity.cast = CastState::Casting { remaining, target };
        AttackStep::None
    }
}
