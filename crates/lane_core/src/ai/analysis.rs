//! Coarse spatial analysis of a forecast snapshot.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::Team;
use crate::forecast::Forecast;
use crate::math::{fixed_decimal, Fixed, Vec2Fixed};

/// Number of horizontal lanes the field is split into.
pub const LANE_COUNT: usize = 3;

/// Lane containing `y`, clamped to the valid range.
#[must_use]
pub fn lane_of(y: Fixed, field_height: Fixed) -> usize {
    if field_height <= Fixed::ZERO {
        return 0;
    }
    let lanes = Fixed::from_num(LANE_COUNT);
    let lane = (y * lanes / field_height).floor().to_num::<i64>();
    lane.clamp(0, LANE_COUNT as i64 - 1) as usize
}

/// Top (inclusive) and bottom (exclusive) Y of a lane.
#[must_use]
pub fn lane_bounds(lane: usize, field_height: Fixed) -> (Fixed, Fixed) {
    let lane = lane.min(LANE_COUNT - 1);
    let height = field_height / Fixed::from_num(LANE_COUNT);
    let top = height * Fixed::from_num(lane);
    (top, top + height)
}

/// Cluster detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Probability that a unit is examined as a cluster seed.
    pub sample_rate: f64,
    /// Neighbour search radius.
    #[serde(with = "fixed_decimal")]
    pub radius: Fixed,
    /// Neighbours needed to record a cluster.
    pub min_neighbours: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            sample_rate: 0.15,
            radius: Fixed::from_num(120),
            min_neighbours: 3,
        }
    }
}

/// A dense group of opposing units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Position of the seed unit.
    pub center: Vec2Fixed,
    /// Same-team neighbours around the seed.
    pub size: usize,
}

/// Lane densities, clusters and the opposing base.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaneAnalysis {
    /// Living non-base opposing units per lane.
    pub counts: [usize; LANE_COUNT],
    /// Lane with the most opposing units (lowest index on ties).
    pub busiest: usize,
    /// Lane with the fewest opposing units (lowest index on ties).
    pub emptiest: usize,
    /// Clusters, densest first.
    pub clusters: Vec<Cluster>,
    /// Opposing base position, if one survives the forecast.
    pub opponent_base: Option<Vec2Fixed>,
}

/// Analyze the `opponent` side of a forecast.
pub fn analyze<R: Rng>(
    forecast: &Forecast,
    opponent: Team,
    field_height: Fixed,
    params: &ClusterParams,
    rng: &mut R,
) -> LaneAnalysis {
    let units: Vec<Vec2Fixed> = forecast
        .alive(opponent)
        .filter(|g| !g.is_base)
        .map(|g| g.position)
        .collect();

    let mut counts = [0usize; LANE_COUNT];
    for position in &units {
        counts[lane_of(position.y, field_height)] += 1;
    }

    let mut busiest = 0;
    let mut emptiest = 0;
    for lane in 1..LANE_COUNT {
        if counts[lane] > counts[busiest] {
            busiest = lane;
        }
        if counts[lane] < counts[emptiest] {
            emptiest = lane;
        }
    }

    let sample_rate = params.sample_rate.clamp(0.0, 1.0);
    let radius_sq = params.radius.saturating_mul(params.radius);
    let mut clusters = Vec::new();
    for (index, seed) in units.iter().enumerate() {
        if !rng.gen_bool(sample_rate) {
            continue;
        }
        let size = units
            .iter()
            .enumerate()
            .filter(|(other, pos)| *other != index && pos.distance_squared(*seed) <= radius_sq)
            .count();
        if size >= params.min_neighbours {
            clusters.push(Cluster { center: *seed, size });
        }
    }
    clusters.sort_by(|a, b| b.size.cmp(&a.size));

    LaneAnalysis {
        counts,
        busiest,
        emptiest,
        clusters,
        opponent_base: forecast.base_position(opponent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Trait, UnitStats};
    use crate::forecast::Ghost;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ghost(team: Team, x: i32, y: i32) -> Ghost {
        let stats = UnitStats {
            hp: 10,
            ..UnitStats::default()
        };
        Ghost::deploy("grunt", team, Vec2Fixed::from_int(x, y), &stats)
    }

    fn snapshot(ghosts: Vec<Ghost>) -> Forecast {
        Forecast {
            ghosts,
            sim_time: Fixed::ZERO,
            steps: 0,
        }
    }

    #[test]
    fn test_lane_of_and_bounds() {
        let height = Fixed::from_num(300);
        assert_eq!(lane_of(Fixed::ZERO, height), 0);
        assert_eq!(lane_of(Fixed::from_num(150), height), 1);
        assert_eq!(lane_of(Fixed::from_num(299), height), 2);
        assert_eq!(lane_of(Fixed::from_num(900), height), 2);
        assert_eq!(lane_of(Fixed::from_num(-5), height), 0);
        assert_eq!(
            lane_bounds(1, height),
            (Fixed::from_num(100), Fixed::from_num(200))
        );
    }

    #[test]
    fn test_lane_counts_ignore_bases_and_dead() {
        let mut dead = ghost(Team::Ally, 100, 150);
        dead.active = false;
        let mut base = ghost(Team::Ally, 20, 250);
        base.is_base = true;
        base.stats.traits.insert(Trait::Base);
        let forecast = snapshot(vec![
            ghost(Team::Ally, 100, 20),
            ghost(Team::Ally, 120, 40),
            ghost(Team::Ally, 100, 160),
            dead,
            base,
            ghost(Team::Enemy, 700, 250),
        ]);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let analysis = analyze(
            &forecast,
            Team::Ally,
            Fixed::from_num(300),
            &ClusterParams::default(),
            &mut rng,
        );
        assert_eq!(analysis.counts, [2, 1, 0]);
        assert_eq!(analysis.busiest, 0);
        assert_eq!(analysis.emptiest, 2);
        assert_eq!(analysis.opponent_base, Some(Vec2Fixed::from_int(20, 250)));
    }

    #[test]
    fn test_clusters_sorted_densest_first() {
        let mut ghosts = vec![ghost(Team::Ally, 400, 280)];
        for i in 0..3 {
            ghosts.push(ghost(Team::Ally, 100 + i * 10, 50));
        }
        for i in 0..5 {
            ghosts.push(ghost(Team::Ally, 300 + i * 10, 150));
        }
        let params = ClusterParams {
            sample_rate: 1.0,
            ..ClusterParams::default()
        };

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let analysis = analyze(
            &snapshot(ghosts),
            Team::Ally,
            Fixed::from_num(300),
            &params,
            &mut rng,
        );
        assert_eq!(analysis.clusters.len(), 5);
        assert!(analysis.clusters.iter().all(|c| c.size == 4));
        assert_eq!(analysis.clusters[0].center, Vec2Fixed::from_int(300, 150));
    }

    #[test]
    fn test_zero_sample_rate_finds_nothing() {
        let ghosts = (0..6).map(|i| ghost(Team::Ally, 100 + i, 100)).collect();
        let params = ClusterParams {
            sample_rate: 0.0,
            ..ClusterParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let analysis = analyze(&snapshot(ghosts), Team::Ally, Fixed::from_num(300), &params, &mut rng);
        assert!(analysis.clusters.is_empty());
    }
}
