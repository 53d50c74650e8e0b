//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the live loop and the forecast
//! produce identical results given identical inputs, and that a forecast
//! never writes back into live state.
//!
//! # Sources of non-determinism
//!
//! - **Floating-point math**: every simulation quantity is
//!   [`lane_core::math::Fixed`]; floats only appear in test setup and in
//!   AI probabilities fed to a seeded RNG.
//! - **Map iteration order**: the roster iterates in handle order and all
//!   keyed tables are `BTreeMap`s.
//! - **Randomness**: only the AI draws random numbers, from a seeded ChaCha
//!   stream.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use lane_core::battle::{Battle, GameSpeed};
use lane_core::combat::NoHooks;
use lane_core::forecast::ForecastConfig;
use lane_core::math::Fixed;

/// Frame length used by the harness: 100 ms.
#[must_use]
pub fn frame() -> Fixed {
    Fixed::from_num(1) / Fixed::from_num(10)
}

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Example
///
/// ```ignore
/// use lane_test_utils::determinism::{frame, verify_determinism};
/// use lane_test_utils::fixtures::skirmish;
///
/// let result = verify_determinism(
///     3,
///     100,
///     skirmish,
///     |battle| { battle.tick(frame(), GameSpeed::Normal, &mut NoHooks); },
///     |battle| battle.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(?hashes, ticks, "Runs diverged");
    }

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a battle twice with no hooks and compare final hashes.
pub fn verify_battle_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Battle,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |battle| {
            battle.tick(frame(), GameSpeed::Normal, &mut NoHooks);
        },
        Battle::state_hash,
    )
    .is_deterministic
}

/// Compare two battle runs tick-by-tick, finding the first divergence.
///
/// Returns `None` if the runs agree throughout, `Some(tick)` otherwise.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Battle,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.tick(frame(), GameSpeed::Normal, &mut NoHooks);
        second.tick(frame(), GameSpeed::Normal, &mut NoHooks);
        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Forecast `battle` to `horizon` and check the live roster is untouched.
///
/// Compares both the state hash and the serialized roster bytes.
pub fn verify_forecast_purity(battle: &Battle, horizon: Fixed) -> bool {
    let hash_before = battle.state_hash();
    let Ok(bytes_before) = battle.roster().to_bytes() else {
        return false;
    };

    let _forecast = battle.forecast(horizon, &ForecastConfig::default());

    let Ok(bytes_after) = battle.roster().to_bytes() else {
        return false;
    };
    hash_before == battle.state_hash() && bytes_before == bytes_after
}

/// Forecast the same battle twice and compare the snapshots.
pub fn verify_forecast_determinism(battle: &Battle, horizon: Fixed) -> bool {
    let config = ForecastConfig::default();
    let first = battle.forecast(horizon, &config);
    let second = battle.forecast(horizon, &config);
    match (first.to_bytes(), second.to_bytes()) {
        (Ok(a), Ok(b)) => a == b && first.state_hash() == second.state_hash(),
        _ => false,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;

    use lane_core::entity::Team;
    use lane_core::math::{Fixed, Vec2Fixed};
    use lane_core::plan::DeploymentPlan;
    use lane_core::status::CcKind;

    /// Signed hp change: damage up to 200, heals up to 100.
    pub fn arb_hp_delta() -> impl Strategy<Value = i32> {
        -100i32..200
    }

    /// Any crowd-control kind.
    pub fn arb_cc_kind() -> impl Strategy<Value = CcKind> {
        prop_oneof![
            Just(CcKind::Stun),
            Just(CcKind::Root),
            Just(CcKind::Silence),
            Just(CcKind::Freeze),
            Just(CcKind::Knockback),
            Just(CcKind::Fear),
        ]
    }

    /// Positive duration on a 0.1 s grid, up to 10 s.
    pub fn arb_duration() -> impl Strategy<Value = Fixed> {
        (1i32..=100).prop_map(|tenths| Fixed::from_num(tenths) / Fixed::from_num(10))
    }

    /// Position on the fixture field.
    pub fn arb_field_position() -> impl Strategy<Value = Vec2Fixed> {
        (0i32..800, 0i32..300).prop_map(|(x, y)| Vec2Fixed::from_int(x, y))
    }

    /// Either side.
    pub fn arb_team() -> impl Strategy<Value = Team> {
        prop_oneof![Just(Team::Ally), Just(Team::Enemy)]
    }

    /// A unit plan drawn from `names`, due within the first five seconds.
    pub fn arb_unit_plan(names: &'static [&'static str]) -> impl Strategy<Value = DeploymentPlan> {
        (
            prop::sample::select(names),
            arb_team(),
            arb_field_position(),
            0i32..50,
        )
            .prop_map(|(name, team, position, tenths)| {
                DeploymentPlan::unit(
                    name,
                    team,
                    position,
                    Fixed::from_num(tenths) / Fixed::from_num(10),
                )
            })
    }
}
