//! Resolution rules shared by the live loop and the forecast.
//!
//! Target selection, hp mutation and area selection live here so both
//! simulation paths stay in agreement. Functions are generic over
//! [`Combatant`] and over the handle type the caller uses to address its
//! records.

use crate::entity::{Entity, Team};
use crate::math::{Fixed, Vec2Fixed};

/// Read access to the combat-relevant parts of an entity or clone.
pub trait Combatant {
    /// Owning side.
    fn team(&self) -> Team;
    /// World position.
    fn position(&self) -> Vec2Fixed;
    /// Alive.
    fn is_active(&self) -> bool;
    /// Spawned and not stealthed.
    fn is_visible(&self) -> bool;
    /// Team base.
    fn is_base(&self) -> bool;
    /// Current hit points.
    fn hp(&self) -> i32;
    /// Maximum hit points.
    fn max_hp(&self) -> i32;
}

impl Combatant for Entity {
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
        Entity::is_base(self)
    }

    fn hp(&self) -> i32 {
        self.current_hp
    }

    fn max_hp(&self) -> i32 {
        self.stats.hp
    }
}

/// How distance to a target is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Straight-line distance to every target.
    Euclidean,
    /// Bases are wide: only X separation counts, less a contact radius.
    BaseContact {
        /// Distance at which a base counts as touched.
        contact_radius: Fixed,
    },
}

impl DistanceMetric {
    /// Distance from `from` to `target`.
    #[must_use]
    pub fn measure<C: Combatant + ?Sized>(self, from: Vec2Fixed, target: &C) -> Fixed {
        match self {
            Self::BaseContact { contact_radius } if target.is_base() => {
                ((target.position().x - from.x).abs() - contact_radius).max(Fixed::ZERO)
            }
            _ => from.distance(target.position()),
        }
    }
}

/// Nearest active, visible member of the opposing team.
///
/// Ties keep the first candidate in iteration order.
pub fn nearest_hostile<'a, K, C, I>(
    pool: I,
    team: Team,
    from: Vec2Fixed,
    metric: DistanceMetric,
) -> Option<(K, Fixed)>
where
    C: Combatant + 'a,
    I: IntoIterator<Item = (K, &'a C)>,
{
    let mut best: Option<(K, Fixed)> = None;
    for (key, candidate) in pool {
        if candidate.team() == team || !candidate.is_active() || !candidate.is_visible() {
            continue;
        }
        let dist = metric.measure(from, candidate);
        if best.as_ref().map_or(true, |(_, d)| dist < *d) {
            best = Some((key, dist));
        }
    }
    best
}

/// Nearest active, injured member of `team` other than `exclude`.
pub fn nearest_injured_ally<'a, K, C, I>(
    pool: I,
    team: Team,
    from: Vec2Fixed,
    exclude: &K,
) -> Option<(K, Fixed)>
where
    K: PartialEq,
    C: Combatant + 'a,
    I: IntoIterator<Item = (K, &'a C)>,
{
    let mut best: Option<(K, Fixed)> = None;
    for (key, candidate) in pool {
        if key == *exclude
            || candidate.team() != team
            || !candidate.is_active()
            || candidate.hp() >= candidate.max_hp()
        {
            continue;
        }
        let dist = from.distance(candidate.position());
        if best.as_ref().map_or(true, |(_, d)| dist < *d) {
            best = Some((key, dist));
        }
    }
    best
}

/// Active candidates within `radius` of `center`.
///
/// Without friendly fire only members of `hostile_team` are returned.
pub fn area_targets<'a, K, C, I>(
    pool: I,
    center: Vec2Fixed,
    radius: Fixed,
    hostile_team: Team,
    friendly_fire: bool,
) -> Vec<K>
where
    C: Combatant + 'a,
    I: IntoIterator<Item = (K, &'a C)>,
{
    let radius_sq = radius.saturating_mul(radius);
    pool.into_iter()
        .filter(|(_, c)| c.is_active())
        .filter(|(_, c)| friendly_fire || c.team() == hostile_team)
        .filter(|(_, c)| c.position().distance_squared(center) <= radius_sq)
        .map(|(key, _)| key)
        .collect()
}

/// Combine an existing effect duration with a new application.
///
/// Durations never stack and a shorter reapplication never shortens.
#[must_use]
pub fn merge_duration<T: Ord>(existing: T, incoming: T) -> T {
    existing.max(incoming)
}

/// Result of one hp mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HpOutcome {
    /// Signed change actually applied (positive = damage).
    pub applied: i32,
    /// This call took the target from alive to dead.
    pub killed: bool,
    /// Damage above the critical threshold.
    pub critical: bool,
}

/// Apply `amount` to an hp pool: positive damages, negative heals.
///
/// No-op on an inactive or already-dead target. The result is clamped to
/// `0..=max_hp`, and a drop to zero clears `active` and reports `killed`
/// exactly once.
pub fn apply_hp_delta(
    hp: &mut i32,
    active: &mut bool,
    max_hp: i32,
    amount: i32,
    crit_threshold: i32,
) -> HpOutcome {
    if !*active || *hp <= 0 {
        return HpOutcome::default();
    }

    let before = *hp;
    *hp = before.saturating_sub(amount).clamp(0, max_hp.max(0));

    let killed = *hp == 0;
    if killed {
        *active = false;
    }

    HpOutcome {
        applied: before - *hp,
        killed,
        critical: amount > crit_threshold,
    }
}
