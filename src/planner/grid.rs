//! Weighted-grid A* planner: routes around keep-out polygons at a fixed
//! altitude layer, reducing the cell path to a heading-change waypoint
//! list.

use std::collections::{BinaryHeap, HashMap};

use crate::geo::{Polygon, Vect3};
use crate::plan::{NavPoint, Plan};

const BASE_WEIGHT: f64 = 5.0;
const KEEP_OUT_WEIGHT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Cell {
    i: i64,
    j: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenEntry {
    f: f64,
    cell: Cell,
}

impl Eq for OpenEntry {}
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest f first.
        other.f.partial_cmp(&self.f).unwrap_or(std::cmp::Ordering::Equal)
    }
}
impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub struct GridPlanner {
    pub grid_size: f64,
    pub buffer_cells: i64,
    /// Per spec Open Question (b): with no keep-in fence, the ceiling
    /// comparison uses `+infinity` rather than a hard-coded cap.
    pub max_alt: f64,
    pub resolution_speed: f64,
    pub max_iterations: usize,
}

impl Default for GridPlanner {
    fn default() -> Self {
        GridPlanner {
            grid_size: 20.0,
            buffer_cells: 10,
            max_alt: f64::INFINITY,
            resolution_speed: 10.0,
            max_iterations: 20_000,
        }
    }
}

pub struct GridResult {
    pub plan: Plan,
    pub goal_reached: bool,
}

impl GridPlanner {
    pub fn search(&self, start: Vect3, goal: Vect3, keep_out: &[Polygon]) -> GridResult {
        let min_x = start.x.min(goal.x) - self.buffer_cells as f64 * self.grid_size;
        let min_y = start.y.min(goal.y) - self.buffer_cells as f64 * self.grid_size;
        let max_x = start.x.max(goal.x) + self.buffer_cells as f64 * self.grid_size;
        let max_y = start.y.max(goal.y) + self.buffer_cells as f64 * self.grid_size;
        let altitude = start.z.min(self.max_alt);

        let to_cell = |p: Vect3| Cell {
            i: ((p.x - min_x) / self.grid_size).round() as i64,
            j: ((p.y - min_y) / self.grid_size).round() as i64,
        };
        let to_point = |c: Cell| Vect3::new(min_x + c.i as f64 * self.grid_size, min_y + c.j as f64 * self.grid_size, altitude);

        let cols = ((max_x - min_x) / self.grid_size).ceil() as i64;
        let rows = ((max_y - min_y) / self.grid_size).ceil() as i64;

        let weight = |c: Cell| -> f64 {
            if c.i < 0 || c.j < 0 || c.i > cols || c.j > rows {
                return f64::INFINITY;
            }
            let p = to_point(c);
            if keep_out.iter().any(|poly| poly.contains_2d(&p)) {
                KEEP_OUT_WEIGHT
            } else {
                BASE_WEIGHT
            }
        };

        let start_cell = to_cell(start);
        let goal_cell = to_cell(goal);

        let heuristic = |c: Cell| -> f64 {
            let dx = (c.i - goal_cell.i) as f64;
            let dy = (c.j - goal_cell.j) as f64;
            (dx * dx + dy * dy).sqrt() * self.grid_size
        };

        let mut open = BinaryHeap::new();
        open.push(OpenEntry { f: heuristic(start_cell), cell: start_cell });
        let mut g_score: HashMap<Cell, f64> = HashMap::new();
        g_score.insert(start_cell, 0.0);
        let mut came_from: HashMap<Cell, Cell> = HashMap::new();

        let neighbors = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)];

        let mut iterations = 0;
        let mut reached = false;
        while let Some(OpenEntry { cell, .. }) = open.pop() {
            iterations += 1;
            if iterations > self.max_iterations {
                break;
            }
            if cell == goal_cell {
                reached = true;
                break;
            }
            let g_here = *g_score.get(&cell).unwrap_or(&f64::INFINITY);
            for (di, dj) in neighbors {
                let next = Cell { i: cell.i + di, j: cell.j + dj };
                let step_cost = if di != 0 && dj != 0 { self.grid_size * std::f64::consts::SQRT_2 } else { self.grid_size };
                let w = weight(next);
                if !w.is_finite() {
                    continue;
                }
                let tentative = g_here + step_cost * (w / BASE_WEIGHT);
                if tentative < *g_score.get(&next).unwrap_or(&f64::INFINITY) {
                    g_score.insert(next, tentative);
                    came_from.insert(next, cell);
                    open.push(OpenEntry { f: tentative + heuristic(next), cell: next });
                }
            }
        }

        let cell_path = if reached {
            let mut path = vec![goal_cell];
            let mut cur = goal_cell;
            while let Some(&prev) = came_from.get(&cur) {
                path.push(prev);
                cur = prev;
                if cur == start_cell {
                    break;
                }
            }
            path.reverse();
            path
        } else {
            vec![start_cell]
        };

        let waypoints = reduce_to_waypoints(&cell_path, to_point);
        let plan = timestamp_waypoints(&waypoints, self.resolution_speed);

        GridResult { plan, goal_reached: reached }
    }
}

/// Retains only cells where the heading changes, plus the first and last.
fn reduce_to_waypoints(cells: &[Cell], to_point: impl Fn(Cell) -> Vect3) -> Vec<Vect3> {
    if cells.is_empty() {
        return Vec::new();
    }
    if cells.len() == 1 {
        return vec![to_point(cells[0])];
    }
    let mut waypoints = vec![to_point(cells[0])];
    let mut prev_dir = (cells[1].i - cells[0].i, cells[1].j - cells[0].j);
    for w in cells.windows(2).skip(1) {
        let dir = (w[1].i - w[0].i, w[1].j - w[0].j);
        if dir != prev_dir {
            waypoints.push(to_point(w[0]));
            prev_dir = dir;
        }
    }
    waypoints.push(to_point(*cells.last().unwrap()));
    waypoints
}

fn timestamp_waypoints(waypoints: &[Vect3], speed: f64) -> Plan {
    let mut plan = Plan::new();
    if waypoints.is_empty() {
        return plan;
    }
    let mut t = 0.0;
    plan.push(NavPoint::new(waypoints[0], t));
    for pair in waypoints.windows(2) {
        let dist = (pair[1] - pair[0]).norm();
        t += dist / speed.max(1e-3);
        plan.push(NavPoint::new(pair[1], t));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_path_with_no_obstacles_reaches_goal() {
        let planner = GridPlanner::default();
        let result = planner.search(Vect3::new(0.0, 0.0, 100.0), Vect3::new(200.0, 0.0, 100.0), &[]);
        assert!(result.goal_reached);
        assert!(result.plan.len() >= 2);
    }

    #[test]
    fn routes_around_a_keep_out_polygon() {
        let planner = GridPlanner::default();
        let obstacle = Polygon::new(
            vec![
                Vect3::new(80.0, -50.0, 0.0),
                Vect3::new(120.0, -50.0, 0.0),
                Vect3::new(120.0, 50.0, 0.0),
                Vect3::new(80.0, 50.0, 0.0),
            ],
            0.0,
            500.0,
        );
        let result = planner.search(Vect3::new(0.0, 0.0, 100.0), Vect3::new(200.0, 0.0, 100.0), &[obstacle.clone()]);
        assert!(result.goal_reached);
        for i in 0..result.plan.len() {
            let p = result.plan.point(i).unwrap();
            assert!(!obstacle.contains_2d(&p.position) || p.position.z > obstacle.ceiling);
        }
    }
}
