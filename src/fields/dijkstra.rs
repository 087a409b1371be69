//! Obstacle-aware shortest-path utility field
//!
//! Runs Dijkstra from the target over the 8-connected grid, with edge
//! costs equal to the Euclidean distance between cell centers (1 cardinal,
//! sqrt(2) diagonal). Obstacles are excluded from the graph structurally,
//! so cells sealed off from the target keep a utility of +inf and their
//! pedestrians never move under this policy.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::error::{Result, SimError};
use crate::core::types::Coord;
use crate::grid::system::System;

/// Frontier entry. Improvements are re-pushed rather than decreased in
/// place; stale entries are skipped via the cell's `visited` flag.
#[derive(Debug, Clone)]
struct FrontierEntry {
    coord: Coord,
    utility: f64,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .utility
            .partial_cmp(&self.utility)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Populates every reachable cell's `distance_utility` with its shortest
/// path cost to the target. Deterministic, so re-running on unchanged
/// placements reproduces identical values.
pub fn solve(system: &mut System) -> Result<()> {
    let target = system.target.ok_or(SimError::NoTarget)?;

    for cell in &mut system.cells {
        cell.distance_utility = f64::INFINITY;
        cell.visited = false;
    }
    system.cell_mut(target).distance_utility = 0.0;

    let mut frontier = BinaryHeap::new();
    frontier.push(FrontierEntry {
        coord: target,
        utility: 0.0,
    });

    let mut finalized = 0usize;
    while let Some(entry) = frontier.pop() {
        let current = entry.coord;
        if system.cell(current).visited {
            continue; // stale entry from a superseded improvement
        }
        system.cell_mut(current).visited = true;
        finalized += 1;

        let base = system.cell(current).distance_utility;
        for neighbor in system.adjacent_minus_obstacles(current) {
            if system.cell(neighbor).visited {
                continue;
            }
            let relaxed = base + current.distance(&neighbor);
            if relaxed < system.cell(neighbor).distance_utility {
                system.cell_mut(neighbor).distance_utility = relaxed;
                frontier.push(FrontierEntry {
                    coord: neighbor,
                    utility: relaxed,
                });
            }
        }
    }

    tracing::debug!(
        finalized,
        total = system.cells.len(),
        "shortest-path utility field solved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CellState;

    fn solved_system(rows: usize, cols: usize, target: Coord, obstacles: &[Coord]) -> System {
        let mut system = System::new(rows, cols).unwrap();
        system.place_target(target).unwrap();
        for &o in obstacles {
            system.place_obstacle(o).unwrap();
        }
        solve(&mut system).unwrap();
        system
    }

    #[test]
    fn test_requires_target() {
        let mut system = System::new(3, 3).unwrap();
        assert!(matches!(solve(&mut system), Err(SimError::NoTarget)));
    }

    #[test]
    fn test_target_utility_is_zero() {
        let system = solved_system(5, 5, Coord::new(0, 0), &[]);
        assert_eq!(system.cell(Coord::new(0, 0)).distance_utility, 0.0);
    }

    #[test]
    fn test_diagonal_distance_on_open_grid() {
        let system = solved_system(5, 5, Coord::new(0, 0), &[]);
        let expected = 4.0 * std::f64::consts::SQRT_2;
        assert!((system.cell(Coord::new(4, 4)).distance_utility - expected).abs() < 1e-9);
        // Mixed path: 3 diagonal steps + 1 cardinal
        let expected = 3.0 * std::f64::consts::SQRT_2 + 1.0;
        assert!((system.cell(Coord::new(3, 4)).distance_utility - expected).abs() < 1e-9);
    }

    #[test]
    fn test_monotone_toward_target() {
        let system = solved_system(6, 6, Coord::new(2, 3), &[]);
        for cell in system.cells() {
            if cell.state == CellState::Target {
                continue;
            }
            // Some neighbor is strictly closer to the target.
            let best = system
                .adjacent(cell.coord)
                .iter()
                .map(|&c| system.cell(c).distance_utility)
                .fold(f64::INFINITY, f64::min);
            assert!(best < cell.distance_utility);
        }
    }

    #[test]
    fn test_obstacles_force_detour() {
        // Wall with a gap at (0,2); going around costs more than the
        // straight line would.
        let wall = [Coord::new(1, 2), Coord::new(2, 2), Coord::new(3, 2), Coord::new(4, 2)];
        let system = solved_system(5, 5, Coord::new(2, 0), &wall);
        let direct = Coord::new(2, 4).distance(&Coord::new(2, 0));
        assert!(system.cell(Coord::new(2, 4)).distance_utility > direct);
        assert!(system.cell(Coord::new(2, 4)).distance_utility.is_finite());
    }

    #[test]
    fn test_sealed_region_stays_infinite() {
        // Ring of obstacles around (4,4) in a 6x6 grid.
        let ring = [
            Coord::new(3, 3),
            Coord::new(3, 4),
            Coord::new(3, 5),
            Coord::new(4, 3),
            Coord::new(5, 3),
            Coord::new(4, 5),
            Coord::new(5, 5),
        ];
        let system = solved_system(6, 6, Coord::new(0, 0), &ring);
        assert!(system.cell(Coord::new(4, 4)).distance_utility.is_infinite());
        for &o in &ring {
            assert!(system.cell(o).distance_utility.is_infinite());
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut system = System::new(5, 5).unwrap();
        system.place_target(Coord::new(1, 1)).unwrap();
        system.place_obstacle(Coord::new(3, 3)).unwrap();
        solve(&mut system).unwrap();
        let first: Vec<f64> = system.cells().iter().map(|c| c.distance_utility).collect();
        solve(&mut system).unwrap();
        let second: Vec<f64> = system.cells().iter().map(|c| c.distance_utility).collect();
        assert_eq!(first, second);
    }
}
