//! Opponent archetypes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::analysis::{LaneAnalysis, LANE_COUNT};
use crate::data::{Trait, UnitStats};

/// Behaviour profile governing lane choice, budget and skill appetite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Archetype {
    /// Always deploys into the emptiest lane.
    Flanker,
    /// Always deploys into the busiest lane.
    Brawler,
    /// Picks lanes per unit role.
    #[default]
    Tactician,
}

impl Archetype {
    /// Budget before stage and round scaling.
    #[must_use]
    pub const fn base_budget(self) -> u32 {
        match self {
            Self::Flanker => 10,
            Self::Brawler => 12,
            Self::Tactician => 11,
        }
    }

    /// Chance per planning attempt of trying a skill first.
    #[must_use]
    pub const fn skill_chance(self) -> f64 {
        match self {
            Self::Flanker => 0.2,
            Self::Brawler => 0.3,
            Self::Tactician => 0.5,
        }
    }

    /// Lane to deploy `unit` into.
    pub fn choose_lane<R: Rng>(self, unit: &UnitStats, analysis: &LaneAnalysis, rng: &mut R) -> usize {
        match self {
            Self::Flanker => flanker_lane(analysis),
            Self::Brawler => brawler_lane(analysis),
            Self::Tactician => tactician_lane(unit, analysis, rng),
        }
    }
}

fn flanker_lane(analysis: &LaneAnalysis) -> usize {
    analysis.emptiest
}

fn brawler_lane(analysis: &LaneAnalysis) -> usize {
    analysis.busiest
}

fn tactician_lane<R: Rng>(unit: &UnitStats, analysis: &LaneAnalysis, rng: &mut R) -> usize {
    if unit.has_trait(Trait::Tank) || unit.has_trait(Trait::Structure) {
        analysis.busiest
    } else if unit.has_trait(Trait::Infiltrator) {
        analysis.emptiest
    } else {
        rng.gen_range(0..LANE_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn analysis() -> LaneAnalysis {
        LaneAnalysis {
            counts: [1, 5, 0],
            busiest: 1,
            emptiest: 2,
            ..LaneAnalysis::default()
        }
    }

    fn with_trait(t: Trait) -> UnitStats {
        let mut stats = UnitStats::default();
        stats.traits.insert(t);
        stats
    }

    #[test]
    fn test_fixed_preference_archetypes() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let unit = UnitStats::default();
        assert_eq!(Archetype::Flanker.choose_lane(&unit, &analysis(), &mut rng), 2);
        assert_eq!(Archetype::Brawler.choose_lane(&unit, &analysis(), &mut rng), 1);
    }

    #[test]
    fn test_tactician_by_role() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let a = analysis();
        assert_eq!(Archetype::Tactician.choose_lane(&with_trait(Trait::Tank), &a, &mut rng), 1);
        assert_eq!(Archetype::Tactician.choose_lane(&with_trait(Trait::Structure), &a, &mut rng), 1);
        assert_eq!(Archetype::Tactician.choose_lane(&with_trait(Trait::Infiltrator), &a, &mut rng), 2);

        let plain = UnitStats::default();
        for _ in 0..20 {
            assert!(Archetype::Tactician.choose_lane(&plain, &a, &mut rng) < LANE_COUNT);
        }
    }
}
