//! Timed deployment plans shared by the live loop, the forecast and the AI.

use serde::{Deserialize, Serialize};

use crate::entity::Team;
use crate::math::{fixed_decimal, to_millis, Fixed, Vec2Fixed};

/// What a plan deploys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanKind {
    /// Spawns one or more units.
    Unit,
    /// Casts an area skill.
    Skill,
}

/// Per-instance offset for multi-spawn deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOffset {
    /// X offset in world units.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Y offset in world units.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
}

/// Spacing between default multi-spawn positions.
const DEFAULT_SPAWN_SPACING: i32 = 20;

/// A timed, positioned deployment instruction.
///
/// Immutable once created except for `spawned`, which is set exactly once
/// when the plan executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Owning team; inferred from the field half when absent.
    #[serde(default)]
    pub team: Option<Team>,
    /// Unit or skill.
    pub kind: PlanKind,
    /// Catalog name.
    pub name: String,
    /// Target X.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Target Y.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
    /// Seconds from round start.
    #[serde(with = "fixed_decimal")]
    pub time: Fixed,
    /// Already executed.
    #[serde(default)]
    pub spawned: bool,
    /// Per-instance offsets for multi-spawn units.
    #[serde(default)]
    pub offsets: Option<Vec<SpawnOffset>>,
}

impl DeploymentPlan {
    /// A unit deployment.
    #[must_use]
    pub fn unit(name: impl Into<String>, team: Team, position: Vec2Fixed, time: Fixed) -> Self {
        Self::new(PlanKind::Unit, name, Some(team), position, time)
    }

    /// A skill cast.
    #[must_use]
    pub fn skill(name: impl Into<String>, team: Team, position: Vec2Fixed, time: Fixed) -> Self {
        Self::new(PlanKind::Skill, name, Some(team), position, time)
    }

    fn new(
        kind: PlanKind,
        name: impl Into<String>,
        team: Option<Team>,
        position: Vec2Fixed,
        time: Fixed,
    ) -> Self {
        Self {
            team,
            kind,
            name: name.into(),
            x: position.x,
            y: position.y,
            time,
            spawned: false,
            offsets: None,
        }
    }

    /// Attach explicit per-instance offsets.
    #[must_use]
    pub fn with_offsets(mut self, offsets: Vec<SpawnOffset>) -> Self {
        self.offsets = Some(offsets);
        self
    }

    /// Target point.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.x, self.y)
    }

    /// Execution time in whole milliseconds.
    #[must_use]
    pub fn time_millis(&self) -> i64 {
        to_millis(self.time)
    }

    /// Explicit team, or the team owning the field half of the target point.
    #[must_use]
    pub fn resolve_team(&self, field_width: Fixed) -> Team {
        self.team
            .unwrap_or_else(|| Team::from_field_half(self.x, field_width))
    }

    /// Spawn points for `count` instances.
    ///
    /// A single instance uses the target point. Multiple instances use the
    /// plan's offsets where given and otherwise fan out vertically.
    #[must_use]
    pub fn spawn_positions(&self, count: u32) -> Vec<Vec2Fixed> {
        let origin = self.position();
        if count <= 1 {
            return vec![origin];
        }

        let explicit = self.offsets.as_deref().unwrap_or(&[]);
        (0..count)
            .map(|i| {
                let offset = explicit.get(i as usize).map_or_else(
                    || {
                        let slot = 2 * i as i32 - (count as i32 - 1);
                        Vec2Fixed::new(
                            Fixed::ZERO,
                            Fixed::from_num(slot * DEFAULT_SPAWN_SPACING / 2),
                        )
                    },
                    |o| Vec2Fixed::new(o.x, o.y),
                );
                origin + offset
            })
            .collect()
    }
}

/// Stable sort ascending by execution time.
pub fn sort_by_time(plans: &mut [DeploymentPlan]) {
    plans.sort_by_key(DeploymentPlan::time_millis);
}

/// Drop plans that already executed.
pub fn retain_pending(plans: &mut Vec<DeploymentPlan>) {
    plans.retain(|p| !p.spawned);
}
