//! Test fixtures and helpers.
//!
//! A small catalog, standard grids and ready-made battles for consistent
//! testing.

use fixed::types::I32F32;
use serde::de::DeserializeOwned;

use lane_core::battle::Battle;
use lane_core::config::BattleConfig;
use lane_core::data::Catalog;
use lane_core::entity::{EntityId, Team};
use lane_core::error::Result;
use lane_core::grid::{BattleGrid, TileKind};
use lane_core::math::Vec2Fixed;
use lane_core::plan::DeploymentPlan;
use lane_core::status::CcRuleTable;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// World position from integer coordinates.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_int(x, y)
}

/// Parse a RON fixture.
///
/// # Panics
///
/// Panics if the fixture is malformed.
#[must_use]
pub fn load_ron<T: DeserializeOwned>(source: &str) -> T {
    match ron::from_str(source) {
        Ok(value) => value,
        Err(e) => panic!("Invalid RON fixture: {e}"),
    }
}

fn must<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Fixture setup failed: {e}"),
    }
}

/// Catalog shared by fixture battles.
pub const CATALOG_RON: &str = r#"(
    units: {
        "soldier": (cost: 2, hp: 60, damage: 10, range: 25.0, attack_speed: 1.0, speed: 60.0),
        "archer": (cost: 3, hp: 35, damage: 8, range: 150.0, attack_speed: 1.2, speed: 45.0,
                   projectile: true),
        "medic": (cost: 3, hp: 40, damage: -12, range: 90.0, attack_speed: 1.5, speed: 50.0),
        "brute": (cost: 4, hp: 140, damage: 18, range: 30.0, attack_speed: 1.6, speed: 40.0,
                  traits: [Tank]),
        "sneak": (cost: 2, hp: 30, damage: 14, range: 20.0, attack_speed: 0.8, speed: 80.0,
                  traits: [Infiltrator, Stealth]),
        "mage": (cost: 4, hp: 45, damage: 30, range: 120.0, attack_speed: 2.0, speed: 40.0,
                 projectile: true, cast_time: Some(0.6)),
        "squad": (cost: 3, hp: 25, damage: 6, range: 25.0, attack_speed: 1.0, speed: 60.0,
                  spawn_count: Some(3)),
        "keep": (cost: 0, hp: 500, damage: 0, range: 0.0, attack_speed: 1.0, speed: 0.0,
                 traits: [Base, Structure]),
    },
    skills: {
        "fireball": (cost: 3, radius: 60.0, damage: 25),
        "ward": (cost: 2, radius: 80.0, shield: 20),
        "quake": (cost: 4, radius: 70.0, damage: 10, stun: Some(1.0), cc: { Knockback: 0.3 }),
    },
)"#;

/// The fixture catalog.
///
/// # Panics
///
/// Panics if [`CATALOG_RON`] fails to parse.
#[must_use]
pub fn catalog() -> Catalog {
    must(Catalog::from_ron_str(CATALOG_RON, "fixtures/catalog.ron"))
}

/// An 800x300 field of 20-unit tiles: ally territory on the left six
/// columns, enemy territory on the right six, neutral between.
///
/// # Panics
///
/// Panics if the fixed dimensions are rejected.
#[must_use]
pub fn open_grid() -> BattleGrid {
    let mut grid = must(BattleGrid::filled(40, 15, fixed(20), TileKind::Neutral));
    for y in 0..15 {
        for x in 0..6 {
            grid.set_tile(x, y, TileKind::OwnTerritory);
        }
        for x in 34..40 {
            grid.set_tile(x, y, TileKind::Contested);
        }
    }
    grid
}

/// [`open_grid`] with a wall down the middle, open only in the top and
/// bottom rows.
#[must_use]
pub fn walled_grid() -> BattleGrid {
    let mut grid = open_grid();
    for y in 1..14 {
        grid.set_tile(20, y, TileKind::Blocked);
    }
    grid
}

/// A battle with both bases placed and nothing else.
///
/// Returns the battle and the ally and enemy base handles.
///
/// # Panics
///
/// Panics if the fixture catalog has no `keep`.
#[must_use]
pub fn empty_battle(grid: BattleGrid) -> (Battle, EntityId, EntityId) {
    let mut battle = Battle::new(grid, catalog(), CcRuleTable::default(), BattleConfig::default());
    let ally = must(battle.place_base("keep", Team::Ally, pos(20, 150)));
    let enemy = must(battle.place_base("keep", Team::Enemy, pos(780, 150)));
    (battle, ally, enemy)
}

/// A scripted skirmish: both sides field a mixed army over two seconds.
#[must_use]
pub fn skirmish() -> Battle {
    let (mut battle, _, _) = empty_battle(open_grid());
    battle.add_plans(Team::Ally, skirmish_plans(Team::Ally));
    battle.add_plans(Team::Enemy, skirmish_plans(Team::Enemy));
    battle
}

/// Mirrored plan list for one side of [`skirmish`].
#[must_use]
pub fn skirmish_plans(team: Team) -> Vec<DeploymentPlan> {
    let x = |offset: i32| match team {
        Team::Ally => offset,
        Team::Enemy => 800 - offset,
    };
    vec![
        DeploymentPlan::unit("soldier", team, pos(x(60), 60), fixed_f(0.0)),
        DeploymentPlan::unit("brute", team, pos(x(70), 150), fixed_f(0.3)),
        DeploymentPlan::unit("archer", team, pos(x(40), 140), fixed_f(0.5)),
        DeploymentPlan::unit("medic", team, pos(x(30), 170), fixed_f(0.8)),
        DeploymentPlan::unit("squad", team, pos(x(60), 240), fixed_f(1.0)),
        DeploymentPlan::unit("mage", team, pos(x(50), 100), fixed_f(1.5)),
        DeploymentPlan::skill("fireball", team, pos(400, 150), fixed_f(6.0)),
    ]
}
