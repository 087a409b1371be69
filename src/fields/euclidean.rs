//! Straight-line distance utility field
//!
//! Assigns every cell its Euclidean distance to the target, obstacles
//! included. Deliberately cruder than the shortest-path field: it has no
//! notion of reachability, and a pedestrian descending it can wedge
//! itself against an obstacle and freeze (see the discrete resolver).

use rayon::prelude::*;

use crate::core::error::{Result, SimError};
use crate::grid::system::System;

/// Fills `distance_utility` for every cell. Pure per-cell computation,
/// done data-parallel.
pub fn solve(system: &mut System) -> Result<()> {
    let target = system.target.ok_or(SimError::NoTarget)?;
    system.cells.par_iter_mut().for_each(|cell| {
        cell.distance_utility = cell.coord.distance(&target);
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Coord;

    #[test]
    fn test_requires_target() {
        let mut system = System::new(2, 2).unwrap();
        assert!(matches!(solve(&mut system), Err(SimError::NoTarget)));
    }

    #[test]
    fn test_fills_every_cell_with_straight_line_distance() {
        let mut system = System::new(4, 4).unwrap();
        system.place_target(Coord::new(0, 0)).unwrap();
        solve(&mut system).unwrap();
        assert_eq!(system.cell(Coord::new(0, 0)).distance_utility, 0.0);
        assert_eq!(system.cell(Coord::new(0, 3)).distance_utility, 3.0);
        assert!((system.cell(Coord::new(3, 3)).distance_utility - 18f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_ignores_obstacles() {
        let mut system = System::new(3, 3).unwrap();
        system.place_target(Coord::new(0, 0)).unwrap();
        system.place_obstacle(Coord::new(1, 1)).unwrap();
        solve(&mut system).unwrap();
        // The obstacle cell gets a finite utility like any other.
        assert!((system.cell(Coord::new(1, 1)).distance_utility - 2f64.sqrt()).abs() < 1e-12);
    }
}
