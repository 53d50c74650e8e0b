//! Grid-based pathfinding using the A* algorithm.
//!
//! Two operating modes share one search implementation:
//!
//! - **Bounded**: a [`PathSearch`] is kept on the entity and advanced by a
//!   fixed node budget each frame, so the cost of long searches is spread
//!   over several frames. Live entities may walk a slightly stale path while
//!   a fresh search completes.
//! - **Unbounded**: [`find_path`] runs a search to completion in one call.
//!   The forecast uses this so its routes are never truncated.
//!
//! All calculations use fixed-point math and deterministic tie-breaking, so
//! identical inputs always yield identical routes.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::grid::BattleGrid;
use crate::math::{Fixed, Vec2Fixed};

/// How much work a search may do per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    /// Expand at most this many nodes per call.
    Bounded {
        /// Node expansions allowed per call.
        nodes_per_frame: u32,
    },
    /// Run to completion.
    Unbounded,
}

impl PathMode {
    const fn budget(self) -> Option<u32> {
        match self {
            Self::Bounded { nodes_per_frame } => Some(nodes_per_frame),
            Self::Unbounded => None,
        }
    }
}

/// Progress of a [`PathSearch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    /// Budget exhausted before the search finished.
    Pending,
    /// A route was found; waypoints are tile centers in world space,
    /// excluding the start tile.
    Found(Vec<Vec2Fixed>),
    /// No route exists.
    Failed,
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    x: u32,
    y: u32,
    f_score: Fixed,
    /// Remaining heuristic; on equal f the node closer to the goal wins.
    h_score: Fixed,
    /// Tie-breaker for determinism: lower coordinates first.
    tie_breaker: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, reverse for min-heap behavior.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.h_score.cmp(&self.h_score))
            .then_with(|| other.tie_breaker.cmp(&self.tie_breaker))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Direction offsets for 8-directional movement.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// Chebyshev distance heuristic (suitable for 8-directional movement).
#[inline]
fn chebyshev_heuristic(x1: u32, y1: u32, x2: u32, y2: u32) -> Fixed {
    let dx = x1.abs_diff(x2);
    let dy = y1.abs_diff(y2);
    Fixed::from_num(dx.max(dy))
}

/// Check if a diagonal move is valid (no corner cutting through blocked tiles).
#[inline]
fn is_diagonal_valid(grid: &BattleGrid, x: u32, y: u32, dx: i32, dy: i32) -> bool {
    if dx != 0 && dy != 0 {
        let check_x = (x as i32 + dx) as u32;
        let check_y = (y as i32 + dy) as u32;
        grid.is_walkable(check_x, y) && grid.is_walkable(x, check_y)
    } else {
        true
    }
}

#[inline]
fn coords_to_tie_breaker(x: u32, y: u32) -> u64 {
    (u64::from(y) << 32) | u64::from(x)
}

/// Find the first walkable neighbour of a tile, scanning [`DIRECTIONS`] in order.
///
/// Returns the tile itself when it is already walkable. Used when separation
/// or knockback left an entity standing on a blocked tile.
#[must_use]
pub fn relocate_to_walkable(grid: &BattleGrid, tile: (u32, u32)) -> Option<(u32, u32)> {
    if grid.is_walkable(tile.0, tile.1) {
        return Some(tile);
    }

    DIRECTIONS.iter().find_map(|&(dx, dy)| {
        let nx = tile.0 as i32 + dx;
        let ny = tile.1 as i32 + dy;
        if nx < 0 || ny < 0 {
            return None;
        }
        let (nx, ny) = (nx as u32, ny as u32);
        grid.is_walkable(nx, ny).then_some((nx, ny))
    })
}

/// A resumable A* search between two tiles.
#[derive(Debug, Clone)]
pub struct PathSearch {
    start: (u32, u32),
    goal: (u32, u32),
    open_set: BinaryHeap<AStarNode>,
    came_from: HashMap<(u32, u32), (u32, u32)>,
    g_score: HashMap<(u32, u32), Fixed>,
    finished: Option<SearchStatus>,
}

impl PathSearch {
    /// Begin a search from `start` to `goal` tile.
    ///
    /// Blocked endpoints are first relocated to an adjacent walkable tile; if
    /// none exists the search is immediately [`SearchStatus::Failed`].
    #[must_use]
    pub fn new(grid: &BattleGrid, start: (u32, u32), goal: (u32, u32)) -> Self {
        let mut search = Self {
            start,
            goal,
            open_set: BinaryHeap::new(),
            came_from: HashMap::new(),
            g_score: HashMap::new(),
            finished: None,
        };

        let (Some(start), Some(goal)) = (
            relocate_to_walkable(grid, start),
            relocate_to_walkable(grid, goal),
        ) else {
            search.finished = Some(SearchStatus::Failed);
            return search;
        };
        search.start = start;
        search.goal = goal;

        if start == goal {
            search.finished = Some(SearchStatus::Found(vec![grid.tile_center(goal.0, goal.1)]));
            return search;
        }

        let h_score = chebyshev_heuristic(start.0, start.1, goal.0, goal.1);
        search.g_score.insert(start, Fixed::ZERO);
        search.open_set.push(AStarNode {
            x: start.0,
            y: start.1,
            f_score: h_score,
            h_score,
            tie_breaker: coords_to_tie_breaker(start.0, start.1),
        });
        search
    }

    /// Goal tile after relocation.
    #[must_use]
    pub const fn goal(&self) -> (u32, u32) {
        self.goal
    }

    /// Check if the search has finished (found or failed).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Advance the search by at most `mode`'s node budget.
    pub fn advance(&mut self, grid: &BattleGrid, mode: PathMode) -> SearchStatus {
        if let Some(status) = &self.finished {
            return status.clone();
        }

        let budget = mode.budget();
        let mut expanded: u32 = 0;
        let (goal_x, goal_y) = self.goal;

        while let Some(current) = self.open_set.pop() {
            if current.x == goal_x && current.y == goal_y {
                let status = SearchStatus::Found(self.reconstruct_path(grid));
                self.finished = Some(status.clone());
                return status;
            }

            let current_g = self
                .g_score
                .get(&(current.x, current.y))
                .copied()
                .unwrap_or(Fixed::MAX);

            // Stale heap entry superseded by a cheaper route.
            if current_g + chebyshev_heuristic(current.x, current.y, goal_x, goal_y)
                < current.f_score
            {
                continue;
            }

            for &(dx, dy) in &DIRECTIONS {
                let nx = current.x as i32 + dx;
                let ny = current.y as i32 + dy;
                if nx < 0 || ny < 0 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);

                if !grid.is_walkable(nx, ny) {
                    continue;
                }
                if !is_diagonal_valid(grid, current.x, current.y, dx, dy) {
                    continue;
                }

                let tentative_g = current_g + Fixed::ONE;
                let neighbor_g = self.g_score.get(&(nx, ny)).copied().unwrap_or(Fixed::MAX);

                if tentative_g < neighbor_g {
                    self.came_from.insert((nx, ny), (current.x, current.y));
                    self.g_score.insert((nx, ny), tentative_g);
                    let h_score = chebyshev_heuristic(nx, ny, goal_x, goal_y);
                    self.open_set.push(AStarNode {
                        x: nx,
                        y: ny,
                        f_score: tentative_g + h_score,
                        h_score,
                        tie_breaker: coords_to_tie_breaker(nx, ny),
                    });
                }
            }

            expanded += 1;
            if budget.is_some_and(|limit| expanded >= limit) {
                return SearchStatus::Pending;
            }
        }

        self.finished = Some(SearchStatus::Failed);
        SearchStatus::Failed
    }

    /// Reconstruct path from the came_from map, dropping the start tile.
    fn reconstruct_path(&self, grid: &BattleGrid) -> Vec<Vec2Fixed> {
        let mut tiles = vec![self.goal];
        let mut current = self.goal;

        while let Some(&prev) = self.came_from.get(&current) {
            if prev == self.start {
                break;
            }
            tiles.push(prev);
            current = prev;
        }

        tiles.reverse();
        let path = tiles
            .into_iter()
            .map(|(x, y)| grid.tile_center(x, y))
            .collect();
        smooth_path(grid, path)
    }
}

/// Find a path between two tiles in one call.
///
/// Returns an empty vector when no route exists.
#[must_use]
pub fn find_path(grid: &BattleGrid, start: (u32, u32), goal: (u32, u32)) -> Vec<Vec2Fixed> {
    match PathSearch::new(grid, start, goal).advance(grid, PathMode::Unbounded) {
        SearchStatus::Found(path) => path,
        SearchStatus::Pending | SearchStatus::Failed => Vec::new(),
    }
}

/// Smooth a path by removing unnecessary waypoints.
///
/// Uses line-of-sight checks to skip intermediate waypoints while
/// ensuring the path doesn't cut through obstacles. The first waypoint is
/// always kept because the caller's own position is not part of the path.
#[must_use]
pub fn smooth_path(grid: &BattleGrid, path: Vec<Vec2Fixed>) -> Vec<Vec2Fixed> {
    if path.len() <= 2 {
        return path;
    }

    let mut smoothed = Vec::with_capacity(path.len());
    smoothed.push(path[0]);

    let mut current_idx = 0;

    while current_idx < path.len() - 1 {
        let mut furthest_visible = current_idx + 1;

        for check_idx in (current_idx + 2)..path.len() {
            if has_line_of_sight(grid, path[current_idx], path[check_idx]) {
                furthest_visible = check_idx;
            }
        }

        smoothed.push(path[furthest_visible]);
        current_idx = furthest_visible;
    }

    smoothed
}

/// Check if there's a clear line of sight between two world positions.
///
/// Uses Bresenham-like stepping through grid tiles.
fn has_line_of_sight(grid: &BattleGrid, start: Vec2Fixed, end: Vec2Fixed) -> bool {
    let Some((x0, y0)) = grid.world_to_tile(start) else {
        return false;
    };
    let Some((x1, y1)) = grid.world_to_tile(end) else {
        return false;
    };

    let dx = (x1 as i32 - x0 as i32).abs();
    let dy = (y1 as i32 - y0 as i32).abs();
    let sx = if x0 < x1 { 1i32 } else { -1i32 };
    let sy = if y0 < y1 { 1i32 } else { -1i32 };
    let mut err = dx - dy;

    let mut x = x0 as i32;
    let mut y = y0 as i32;

    loop {
        if !grid.is_walkable(x as u32, y as u32) {
            return false;
        }

        if x == x1 as i32 && y == y1 as i32 {
            break;
        }

        let e2 = 2 * err;

        if e2 > -dy && e2 < dx {
            let next_x = x + sx;
            let next_y = y + sy;
            if !grid.is_walkable(next_x as u32, y as u32)
                || !grid.is_walkable(x as u32, next_y as u32)
            {
                return false;
            }
        }

        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileKind;

    fn open_grid(width: u32, height: u32) -> BattleGrid {
        BattleGrid::filled(width, height, Fixed::from_num(10), TileKind::Neutral).unwrap()
    }

    #[test]
    fn test_simple_path_ends_at_goal() {
        let grid = open_grid(10, 10);
        let path = find_path(&grid, (0, 0), (5, 5));

        assert!(!path.is_empty());
        assert_eq!(*path.last().unwrap(), grid.tile_center(5, 5));
        assert_ne!(path[0], grid.tile_center(0, 0));
    }

    #[test]
    fn test_path_around_obstacle() {
        let mut grid = open_grid(10, 10);
        for y in 2..8 {
            grid.set_tile(5, y, TileKind::Blocked);
        }

        let path = find_path(&grid, (2, 5), (8, 5));
        assert!(!path.is_empty());
        for point in &path {
            let (gx, gy) = grid.world_to_tile(*point).unwrap();
            assert!(grid.is_walkable(gx, gy), "path crosses blocked ({gx}, {gy})");
        }
    }

    #[test]
    fn test_no_path_is_empty() {
        let mut grid = open_grid(10, 10);
        for y in 0..10 {
            grid.set_tile(5, y, TileKind::Blocked);
        }

        assert!(find_path(&grid, (2, 5), (8, 5)).is_empty());
    }

    #[test]
    fn test_out_of_bounds_codes_are_not_traversable() {
        let mut grid = open_grid(10, 3);
        for y in 0..3 {
            grid.set_tile(4, y, TileKind::OutOfBounds);
        }

        assert!(find_path(&grid, (0, 1), (9, 1)).is_empty());
    }

    #[test]
    fn test_blocked_start_is_relocated() {
        let mut grid = open_grid(10, 10);
        grid.set_tile(3, 3, TileKind::Blocked);

        let path = find_path(&grid, (3, 3), (8, 3));
        assert!(!path.is_empty());
        assert_eq!(*path.last().unwrap(), grid.tile_center(8, 3));
    }

    #[test]
    fn test_fully_enclosed_start_fails() {
        let mut grid = open_grid(5, 5);
        for y in 0..3 {
            for x in 0..3 {
                grid.set_tile(x, y, TileKind::Blocked);
            }
        }

        assert!(find_path(&grid, (1, 1), (4, 4)).is_empty());
    }

    #[test]
    fn test_same_tile_yields_single_waypoint() {
        let grid = open_grid(10, 10);
        let path = find_path(&grid, (5, 5), (5, 5));
        assert_eq!(path, vec![grid.tile_center(5, 5)]);
    }

    #[test]
    fn test_bounded_search_resumes_to_same_result() {
        let mut grid = open_grid(30, 30);
        for y in 0..25 {
            grid.set_tile(15, y, TileKind::Blocked);
        }

        let unbounded = find_path(&grid, (2, 2), (28, 2));

        let mut search = PathSearch::new(&grid, (2, 2), (28, 2));
        let mode = PathMode::Bounded { nodes_per_frame: 8 };
        let mut frames = 0;
        let bounded = loop {
            frames += 1;
            match search.advance(&grid, mode) {
                SearchStatus::Pending => continue,
                SearchStatus::Found(path) => break path,
                SearchStatus::Failed => panic!("route should exist"),
            }
        };

        assert!(frames > 1, "budget should spread the search over frames");
        assert_eq!(bounded, unbounded);
        assert!(search.is_finished());
    }

    #[test]
    fn test_determinism() {
        let mut grid = open_grid(20, 20);
        for i in 5..15 {
            grid.set_tile(10, i, TileKind::Blocked);
        }

        let path1 = find_path(&grid, (5, 10), (15, 10));
        let path2 = find_path(&grid, (5, 10), (15, 10));
        assert_eq!(path1, path2);
    }

    #[test]
    fn test_path_smoothing() {
        let grid = open_grid(10, 10);
        let path: Vec<_> = (0..5).map(|i| grid.tile_center(i, i)).collect();

        let smoothed = smooth_path(&grid, path);
        assert!(smoothed.len() <= 2);
        assert_eq!(*smoothed.last().unwrap(), grid.tile_center(4, 4));
    }

    #[test]
    fn test_chebyshev_heuristic() {
        assert_eq!(chebyshev_heuristic(0, 0, 5, 5), Fixed::from_num(5));
        assert_eq!(chebyshev_heuristic(0, 0, 3, 7), Fixed::from_num(7));
        assert_eq!(chebyshev_heuristic(5, 5, 5, 5), Fixed::ZERO);
    }
}
