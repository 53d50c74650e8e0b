//! Battlefield classification grid.
//!
//! The grid is supplied by the map layer as a 2D array of small integers and
//! is read-only for the whole battle. Each tile is classified once on load.

use serde::{Deserialize, Serialize};

use crate::entity::Team;
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Tile classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    /// Open ground nobody controls (`0`).
    #[default]
    Neutral,
    /// Impassable terrain (`1`).
    Blocked,
    /// The ally side's deployment territory (`2`).
    OwnTerritory,
    /// Contested ground watched by the enemy side (`3`).
    Contested,
    /// Anything else: outside the playable area.
    OutOfBounds,
}

impl TileKind {
    /// Classify a raw grid code.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Neutral,
            1 => Self::Blocked,
            2 => Self::OwnTerritory,
            3 => Self::Contested,
            _ => Self::OutOfBounds,
        }
    }

    /// Raw grid code for this classification.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Neutral => 0,
            Self::Blocked => 1,
            Self::OwnTerritory => 2,
            Self::Contested => 3,
            Self::OutOfBounds => 255,
        }
    }

    /// Returns true if units may stand on or path through this tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Neutral | Self::OwnTerritory | Self::Contested)
    }

    /// The classification a team may deploy onto without restriction.
    #[must_use]
    pub const fn controlled_by(team: Team) -> Self {
        match team {
            Team::Ally => Self::OwnTerritory,
            Team::Enemy => Self::Contested,
        }
    }

    /// Whether `team` may deploy a unit here.
    ///
    /// Regular units need the team's own territory; infiltrators may also
    /// use neutral ground. Blocked, out-of-bounds and the opposing side's
    /// territory are never valid.
    #[must_use]
    pub fn is_deployable(self, team: Team, infiltrator: bool) -> bool {
        if self == Self::controlled_by(team) {
            return true;
        }
        infiltrator && self == Self::Neutral
    }
}

/// Classification grid for the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleGrid {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Tile data stored in row-major order.
    tiles: Vec<TileKind>,
    /// Size of each tile in world units.
    #[serde(with = "fixed_serde")]
    tile_size: Fixed,
}

impl BattleGrid {
    /// Create a grid with every tile set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidGrid`] if a dimension is zero or the tile
    /// size is not positive.
    pub fn filled(width: u32, height: u32, tile_size: Fixed, fill: TileKind) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidGrid(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        if tile_size <= Fixed::ZERO {
            return Err(GameError::InvalidGrid("tile size must be positive".into()));
        }

        Ok(Self {
            width,
            height,
            tiles: vec![fill; (width as usize) * (height as usize)],
            tile_size,
        })
    }

    /// Build a grid from rows of raw classification codes (row 0 is the top).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidGrid`] if there are no rows, rows are
    /// empty, or rows have different lengths.
    pub fn from_rows(rows: &[Vec<u8>], tile_size: Fixed) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GameError::InvalidGrid(format!(
                "row {index} has {} tiles, expected {width}",
                row.len()
            )));
        }

        let mut grid = Self::filled(width as u32, height as u32, tile_size, TileKind::Neutral)?;
        for (y, row) in rows.iter().enumerate() {
            for (x, &code) in row.iter().enumerate() {
                grid.set_tile(x as u32, y as u32, TileKind::from_code(code));
            }
        }
        Ok(grid)
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile size in world units.
    #[must_use]
    pub const fn tile_size(&self) -> Fixed {
        self.tile_size
    }

    /// Field width in world units.
    #[must_use]
    pub fn field_width(&self) -> Fixed {
        Fixed::from_num(self.width) * self.tile_size
    }

    /// Field height in world units.
    #[must_use]
    pub fn field_height(&self) -> Fixed {
        Fixed::from_num(self.height) * self.tile_size
    }

    #[inline]
    fn coords_to_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Check if tile coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Classification at tile coordinates; out-of-range reads as
    /// [`TileKind::OutOfBounds`].
    #[must_use]
    pub fn tile(&self, x: u32, y: u32) -> TileKind {
        if self.in_bounds(x, y) {
            self.tiles[self.coords_to_index(x, y)]
        } else {
            TileKind::OutOfBounds
        }
    }

    /// Set the classification at tile coordinates.
    /// Returns `false` if out of bounds.
    pub fn set_tile(&mut self, x: u32, y: u32, kind: TileKind) -> bool {
        if self.in_bounds(x, y) {
            let index = self.coords_to_index(x, y);
            self.tiles[index] = kind;
            true
        } else {
            false
        }
    }

    /// Check if a tile is walkable.
    #[must_use]
    pub fn is_walkable(&self, x: u32, y: u32) -> bool {
        self.tile(x, y).is_walkable()
    }

    /// Convert world position to tile coordinates.
    ///
    /// Returns `None` if the position is outside the grid bounds.
    #[must_use]
    pub fn world_to_tile(&self, pos: Vec2Fixed) -> Option<(u32, u32)> {
        if pos.x < Fixed::ZERO || pos.y < Fixed::ZERO {
            return None;
        }

        let x = (pos.x / self.tile_size).to_num::<i64>();
        let y = (pos.y / self.tile_size).to_num::<i64>();

        if x < i64::from(self.width) && y < i64::from(self.height) {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }

    /// Classification under a world position.
    #[must_use]
    pub fn tile_at(&self, pos: Vec2Fixed) -> TileKind {
        self.world_to_tile(pos)
            .map_or(TileKind::OutOfBounds, |(x, y)| self.tile(x, y))
    }

    /// Check if a world position is walkable.
    #[must_use]
    pub fn is_walkable_at(&self, pos: Vec2Fixed) -> bool {
        self.tile_at(pos).is_walkable()
    }

    /// Convert tile coordinates to world position (center of tile).
    #[must_use]
    pub fn tile_center(&self, x: u32, y: u32) -> Vec2Fixed {
        let half = self.tile_size / Fixed::from_num(2);
        Vec2Fixed::new(
            Fixed::from_num(x) * self.tile_size + half,
            Fixed::from_num(y) * self.tile_size + half,
        )
    }

    /// Clamp a world position into the field rectangle.
    #[must_use]
    pub fn clamp_to_field(&self, pos: Vec2Fixed) -> Vec2Fixed {
        let max_x = self.field_width() - Fixed::DELTA;
        let max_y = self.field_height() - Fixed::DELTA;
        Vec2Fixed::new(
            pos.x.clamp(Fixed::ZERO, max_x),
            pos.y.clamp(Fixed::ZERO, max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_tile_codes() {
        assert_eq!(TileKind::from_code(0), TileKind::Neutral);
        assert_eq!(TileKind::from_code(1), TileKind::Blocked);
        assert_eq!(TileKind::from_code(2), TileKind::OwnTerritory);
        assert_eq!(TileKind::from_code(3), TileKind::Contested);
        assert_eq!(TileKind::from_code(9), TileKind::OutOfBounds);

        assert!(!TileKind::Blocked.is_walkable());
        assert!(!TileKind::OutOfBounds.is_walkable());
        assert!(TileKind::Contested.is_walkable());
    }

    #[test]
    fn test_deployability() {
        assert!(TileKind::OwnTerritory.is_deployable(Team::Ally, false));
        assert!(!TileKind::Contested.is_deployable(Team::Ally, false));
        assert!(TileKind::Contested.is_deployable(Team::Enemy, false));
        assert!(!TileKind::Neutral.is_deployable(Team::Enemy, false));
        assert!(TileKind::Neutral.is_deployable(Team::Enemy, true));
        assert!(!TileKind::Blocked.is_deployable(Team::Enemy, true));
    }

    #[test]
    fn test_from_rows() {
        let grid = BattleGrid::from_rows(&[vec![2, 0, 3], vec![2, 1, 3]], fixed(10)).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.tile(1, 1), TileKind::Blocked);
        assert_eq!(grid.tile(2, 0), TileKind::Contested);
        assert_eq!(grid.field_width(), fixed(30));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let result = BattleGrid::from_rows(&[vec![0, 0], vec![0]], fixed(10));
        assert!(matches!(result, Err(GameError::InvalidGrid(_))));

        let empty = BattleGrid::from_rows(&[], fixed(10));
        assert!(empty.is_err());
    }

    #[test]
    fn test_world_to_tile_conversion() {
        let grid = BattleGrid::filled(10, 10, fixed(2), TileKind::Neutral).unwrap();

        assert_eq!(grid.world_to_tile(Vec2Fixed::from_int(1, 1)), Some((0, 0)));
        assert_eq!(grid.world_to_tile(Vec2Fixed::from_int(3, 3)), Some((1, 1)));
        assert_eq!(grid.world_to_tile(Vec2Fixed::from_int(19, 19)), Some((9, 9)));
        assert_eq!(grid.world_to_tile(Vec2Fixed::from_int(20, 20)), None);
        assert_eq!(grid.world_to_tile(Vec2Fixed::from_int(-1, 0)), None);
        assert_eq!(grid.tile_at(Vec2Fixed::from_int(-1, 0)), TileKind::OutOfBounds);
    }

    #[test]
    fn test_tile_center() {
        let grid = BattleGrid::filled(10, 10, fixed(2), TileKind::Neutral).unwrap();
        assert_eq!(grid.tile_center(0, 0), Vec2Fixed::from_int(1, 1));
        assert_eq!(grid.tile_center(1, 1), Vec2Fixed::from_int(3, 3));
    }
}
