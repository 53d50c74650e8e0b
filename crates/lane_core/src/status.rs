//! Crowd-control status effects and the rule table that interprets them.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal_map, Fixed};
use crate::rules::merge_duration;

/// Named crowd-control effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CcKind {
    /// Cannot move or attack.
    Stun,
    /// Cannot move.
    Root,
    /// Cannot attack.
    Silence,
    /// Cannot move or attack.
    Freeze,
    /// Displaced away from the impact point.
    Knockback,
    /// Cannot attack.
    Fear,
}

impl CcKind {
    /// Kinds that also displace the target when applied by a skill.
    #[must_use]
    pub const fn is_knockback(self) -> bool {
        matches!(self, Self::Knockback)
    }
}

/// Behavioural restriction imposed by one kind of crowd control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcRule {
    /// Whether the affected unit may move.
    pub can_move: bool,
    /// Whether the affected unit may start attacks.
    pub can_attack: bool,
    /// Whether an in-progress cast is interrupted.
    pub cancel_cast: bool,
    /// Text shown above the affected unit.
    #[serde(default)]
    pub display_message: String,
}

impl CcRule {
    fn new(can_move: bool, can_attack: bool, cancel_cast: bool, message: &str) -> Self {
        Self {
            can_move,
            can_attack,
            cancel_cast,
            display_message: message.to_string(),
        }
    }
}

/// Read-only mapping from [`CcKind`] to [`CcRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CcRuleTable {
    rules: BTreeMap<CcKind, CcRule>,
}

impl Default for CcRuleTable {
    fn default() -> Self {
        let rules = BTreeMap::from([
            (CcKind::Stun, CcRule::new(false, false, true, "Stunned!")),
            (CcKind::Root, CcRule::new(false, true, false, "Rooted!")),
            (CcKind::Silence, CcRule::new(true, false, true, "Silenced!")),
            (CcKind::Freeze, CcRule::new(false, false, true, "Frozen!")),
            (CcKind::Knockback, CcRule::new(false, false, true, "Knocked back!")),
            (CcKind::Fear, CcRule::new(true, false, true, "Feared!")),
        ]);
        Self { rules }
    }
}

impl CcRuleTable {
    /// Build a table from explicit rules.
    #[must_use]
    pub fn new(rules: BTreeMap<CcKind, CcRule>) -> Self {
        Self { rules }
    }

    /// Parse a table from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the text is not a valid table.
    pub fn from_ron_str(source: &str, path: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::ron(path, &e))
    }

    /// Rule for a kind, if the table defines one.
    #[must_use]
    pub fn get(&self, kind: CcKind) -> Option<&CcRule> {
        self.rules.get(&kind)
    }
}

/// Effective restrictions after folding every active effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    /// Movement allowed.
    pub can_move: bool,
    /// Attacks allowed.
    pub can_attack: bool,
    /// An in-progress cast must be interrupted.
    pub cancel_cast: bool,
}

impl ControlState {
    /// No restrictions.
    pub const FREE: Self = Self {
        can_move: true,
        can_attack: true,
        cancel_cast: false,
    };
}

/// Remaining duration per active crowd-control kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    #[serde(with = "fixed_decimal_map")]
    remaining: BTreeMap<CcKind, Fixed>,
}

impl StatusEffects {
    /// Apply an effect. The new remaining time is the larger of the existing
    /// and the incoming duration.
    pub fn apply(&mut self, kind: CcKind, duration: Fixed) {
        if duration <= Fixed::ZERO {
            return;
        }
        let slot = self.remaining.entry(kind).or_insert(Fixed::ZERO);
        *slot = merge_duration(*slot, duration);
    }

    /// Remaining seconds for a kind (zero if inactive).
    #[must_use]
    pub fn remaining(&self, kind: CcKind) -> Fixed {
        self.remaining.get(&kind).copied().unwrap_or(Fixed::ZERO)
    }

    /// Returns true if the kind has time left.
    #[must_use]
    pub fn is_active(&self, kind: CcKind) -> bool {
        self.remaining(kind) > Fixed::ZERO
    }

    /// Returns true if no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Active kinds in ascending order.
    pub fn kinds(&self) -> impl Iterator<Item = CcKind> + '_ {
        self.remaining.keys().copied()
    }

    /// Count every effect down by `dt`, dropping expired ones.
    pub fn tick(&mut self, dt: Fixed) {
        for value in self.remaining.values_mut() {
            *value -= dt;
        }
        self.remaining.retain(|_, v| *v > Fixed::ZERO);
    }

    /// OR-fold of the restrictions of every active kind.
    ///
    /// A kind the table has no rule for imposes nothing.
    #[must_use]
    pub fn control(&self, table: &CcRuleTable) -> ControlState {
        self.kinds()
            .filter_map(|kind| table.get(kind))
            .fold(ControlState::FREE, |state, rule| ControlState {
                can_move: state.can_move && rule.can_move,
                can_attack: state.can_attack && rule.can_attack,
                cancel_cast: state.cancel_cast || rule.cancel_cast,
            })
    }

    pub(crate) fn hash_into(&self, hasher: &mut DefaultHasher) {
        for (kind, value) in &self.remaining {
            kind.hash(hasher);
            value.to_bits().hash(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Fixed {
        Fixed::from_num(s)
    }

    #[test]
    fn test_apply_takes_max() {
        let mut effects = StatusEffects::default();
        effects.apply(CcKind::Stun, secs(2.0));
        effects.apply(CcKind::Stun, secs(1.0));
        assert_eq!(effects.remaining(CcKind::Stun), secs(2.0));

        effects.apply(CcKind::Stun, secs(3.0));
        assert_eq!(effects.remaining(CcKind::Stun), secs(3.0));
    }

    #[test]
    fn test_tick_expires() {
        let mut effects = StatusEffects::default();
        effects.apply(CcKind::Root, secs(0.5));
        effects.tick(secs(0.25));
        assert!(effects.is_active(CcKind::Root));
        effects.tick(secs(0.25));
        assert!(!effects.is_active(CcKind::Root));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_control_is_or_folded() {
        let table = CcRuleTable::default();
        let mut effects = StatusEffects::default();
        assert_eq!(effects.control(&table), ControlState::FREE);

        effects.apply(CcKind::Root, secs(1.0));
        let rooted = effects.control(&table);
        assert!(!rooted.can_move);
        assert!(rooted.can_attack);
        assert!(!rooted.cancel_cast);

        effects.apply(CcKind::Silence, secs(1.0));
        let both = effects.control(&table);
        assert!(!both.can_move);
        assert!(!both.can_attack);
        assert!(both.cancel_cast);
    }

    #[test]
    fn test_unknown_kind_is_unrestricted() {
        let table = CcRuleTable::new(BTreeMap::new());
        let mut effects = StatusEffects::default();
        effects.apply(CcKind::Stun, secs(1.0));
        assert_eq!(effects.control(&table), ControlState::FREE);
    }

    #[test]
    fn test_rule_table_from_ron() {
        let source = r#"{
            Stun: (can_move: false, can_attack: false, cancel_cast: true, display_message: "Zzz"),
        }"#;
        let table = CcRuleTable::from_ron_str(source, "cc.ron").unwrap();
        assert_eq!(table.get(CcKind::Stun).unwrap().display_message, "Zzz");
        assert!(table.get(CcKind::Root).is_none());

        assert!(CcRuleTable::from_ron_str("{ Nope: () }", "bad.ron").is_err());
    }
}
