//! Occupancy grid derivation and A* search.
//!
//! The grid is rebuilt from the continuous obstacle set each time a
//! path is requested. A candidate cell is traversable only when the
//! 2x2 block of cells starting at it is clear; this deliberate
//! over-blocking leaves room for the vehicle's own footprint.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::core::Vec2;
use crate::geometry::Aabb;
use crate::map::WorldMap;

/// A grid cell as `(col, row)`.
pub type GridCell = (usize, usize);

/// Boolean occupancy grid derived from the obstacle set.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cols: usize,
    rows: usize,
    cell_size: f32,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    /// Rasterize the obstacle set at the given cell size.
    pub fn from_map(map: &WorldMap, cell_size: f32) -> Self {
        let cols = (map.arena.width / cell_size).round().max(1.0) as usize;
        let rows = (map.arena.height / cell_size).round().max(1.0) as usize;
        let mut grid = Self {
            cols,
            rows,
            cell_size,
            blocked: vec![false; cols * rows],
        };

        for obstacle in &map.obstacles {
            let bounds = obstacle.bounds();
            let col_start = (bounds.min.x / cell_size).floor().max(0.0) as usize;
            let row_start = (bounds.min.y / cell_size).floor().max(0.0) as usize;
            let col_end = ((bounds.max.x / cell_size).ceil() as usize).min(cols);
            let row_end = ((bounds.max.y / cell_size).ceil() as usize).min(rows);

            for row in row_start..row_end {
                for col in col_start..col_end {
                    let cell_box = Aabb::new(
                        col as f32 * cell_size,
                        row as f32 * cell_size,
                        (col + 1) as f32 * cell_size,
                        (row + 1) as f32 * cell_size,
                    );
                    if obstacle.intersects_aabb(&cell_box) {
                        grid.blocked[row * cols + col] = true;
                    }
                }
            }
        }

        grid
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Is this cell marked by an obstacle footprint? Out-of-range
    /// cells read as free so the dilation never blocks the last
    /// row/column spuriously.
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        let (col, row) = cell;
        if col >= self.cols || row >= self.rows {
            return false;
        }
        self.blocked[row * self.cols + col]
    }

    /// Can the vehicle occupy this cell? Checks the 2x2 block starting
    /// at the cell, accounting for the vehicle footprint.
    pub fn is_traversable(&self, cell: GridCell) -> bool {
        let (col, row) = cell;
        if col >= self.cols || row >= self.rows {
            return false;
        }
        !(self.is_blocked((col, row))
            || self.is_blocked((col + 1, row))
            || self.is_blocked((col, row + 1))
            || self.is_blocked((col + 1, row + 1)))
    }

    /// Cell containing a world position, if inside the grid.
    pub fn cell_at(&self, pos: Vec2) -> Option<GridCell> {
        let col = (pos.x / self.cell_size).floor();
        let row = (pos.y / self.cell_size).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some((col, row))
    }

    /// World position of a cell's center.
    pub fn cell_center(&self, cell: GridCell) -> Vec2 {
        Vec2::new(
            (cell.0 as f32 + 0.5) * self.cell_size,
            (cell.1 as f32 + 0.5) * self.cell_size,
        )
    }
}

/// Node in the A* open set, ordered for a min-heap on `f`.
#[derive(Clone)]
struct AStarNode {
    cell: GridCell,
    f_score: u32,
}

impl Eq for AStarNode {}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f_score.cmp(&self.f_score)
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Manhattan distance heuristic.
fn heuristic(a: GridCell, b: GridCell) -> u32 {
    (a.0.abs_diff(b.0) + a.1.abs_diff(b.1)) as u32
}

/// A* over the occupancy grid: 4-connected, uniform step cost.
///
/// Returns the cell path from `start` to `goal` inclusive, or an empty
/// vector when the goal is unreachable or blocked. An empty path is a
/// normal outcome, not an error; callers treat it as "do nothing".
pub fn find_path(grid: &OccupancyGrid, start: GridCell, goal: GridCell) -> Vec<GridCell> {
    if start.0 >= grid.cols()
        || start.1 >= grid.rows()
        || !grid.is_traversable(goal)
    {
        return Vec::new();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
    let mut g_score: HashMap<GridCell, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        cell: start,
        f_score: heuristic(start, goal),
    });

    while let Some(current) = open_set.pop() {
        if current.cell == goal {
            return reconstruct_path(&came_from, start, goal);
        }

        let current_g = *g_score.get(&current.cell).unwrap_or(&u32::MAX);

        let (col, row) = (current.cell.0 as i64, current.cell.1 as i64);
        for (dc, dr) in [(1i64, 0i64), (-1, 0), (0, 1), (0, -1)] {
            let nc = col + dc;
            let nr = row + dr;
            if nc < 0 || nr < 0 || nc as usize >= grid.cols() || nr as usize >= grid.rows() {
                continue;
            }
            let neighbor = (nc as usize, nr as usize);
            if !grid.is_traversable(neighbor) {
                continue;
            }

            let tentative_g = current_g + 1;
            if tentative_g < *g_score.get(&neighbor).unwrap_or(&u32::MAX) {
                came_from.insert(neighbor, current.cell);
                g_score.insert(neighbor, tentative_g);
                open_set.push(AStarNode {
                    cell: neighbor,
                    f_score: tentative_g + heuristic(neighbor, goal),
                });
            }
        }
    }

    Vec::new()
}

/// Walk the `came_from` map back from the goal.
fn reconstruct_path(
    came_from: &HashMap<GridCell, GridCell>,
    start: GridCell,
    goal: GridCell,
) -> Vec<GridCell> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
