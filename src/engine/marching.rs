//! Fast-marching solver for the Eikonal equation |grad T| = 1 / speed
//!
//! Front propagation from the target over the 4-connected upwind stencil:
//! a narrow-band min-heap pops the smallest tentative time, freezes it,
//! and relaxes its neighbors with the first-order two-axis update. Like
//! the shortest-path solver, improvements re-push entries and stale pops
//! are skipped, never decreased in place.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::types::Coord;
use crate::grid::system::System;

/// Cached outputs of the two Eikonal solves the continuous engine needs.
#[derive(Debug, Clone)]
pub struct FmmFields {
    /// Speed-weighted travel time from the target, obstacle cells +inf.
    pub travel_time: Vec<f64>,
    /// Unit-speed, unmasked geometric distance from the target. Used only
    /// to seed arrival-time predictions.
    pub distance: Vec<f64>,
}

#[derive(Debug, Clone)]
struct BandEntry {
    idx: usize,
    time: f64,
}

impl PartialEq for BandEntry {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}

impl Eq for BandEntry {}

impl Ord for BandEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for BandEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Travel-time field: speed field applied, obstacles excluded from the
/// solve entirely (their time stays +inf).
pub fn solve_travel_time(system: &System, target: Coord) -> Vec<f64> {
    fast_march(
        system,
        target,
        Some(&system.speed_field),
        system.config.travel_time_dx,
        true,
    )
}

/// Geometric distance field: unit speed, no obstacle mask.
pub fn solve_distance(system: &System, target: Coord) -> Vec<f64> {
    fast_march(system, target, None, system.config.distance_dx, false)
}

fn fast_march(
    system: &System,
    target: Coord,
    speed: Option<&[f64]>,
    dx: f64,
    mask_obstacles: bool,
) -> Vec<f64> {
    let rows = system.rows();
    let cols = system.cols();
    let mut time = vec![f64::INFINITY; rows * cols];
    let mut frozen = vec![false; rows * cols];
    let mut masked = vec![false; rows * cols];
    if mask_obstacles {
        for &obstacle in system.obstacles() {
            masked[obstacle.row * cols + obstacle.col] = true;
        }
    }

    let seed = target.row * cols + target.col;
    time[seed] = 0.0;
    let mut band = BinaryHeap::new();
    band.push(BandEntry {
        idx: seed,
        time: 0.0,
    });

    while let Some(entry) = band.pop() {
        if frozen[entry.idx] {
            continue;
        }
        frozen[entry.idx] = true;

        let row = entry.idx / cols;
        let col = entry.idx % cols;
        for (nr, nc) in cardinal_neighbors(row, col, rows, cols) {
            let nidx = nr * cols + nc;
            if frozen[nidx] || masked[nidx] {
                continue;
            }
            let f = speed.map_or(1.0, |s| s[nidx]);
            if f <= f64::EPSILON {
                continue; // zero-speed cells are impassable
            }
            let t = upwind_update(&time, nr, nc, rows, cols, dx / f);
            if t < time[nidx] {
                time[nidx] = t;
                band.push(BandEntry { idx: nidx, time: t });
            }
        }
    }

    time
}

/// First-order two-axis update: with `a`, `b` the smaller tentative times
/// along the row and column axes and `h = dx / speed`, solve
/// `max(T - a, 0)^2 + max(T - b, 0)^2 = h^2` for T.
fn upwind_update(time: &[f64], row: usize, col: usize, rows: usize, cols: usize, h: f64) -> f64 {
    let mut a = f64::INFINITY; // best along the row axis
    if row >= 1 {
        a = a.min(time[(row - 1) * cols + col]);
    }
    if row + 1 < rows {
        a = a.min(time[(row + 1) * cols + col]);
    }
    let mut b = f64::INFINITY; // best along the column axis
    if col >= 1 {
        b = b.min(time[row * cols + col - 1]);
    }
    if col + 1 < cols {
        b = b.min(time[row * cols + col + 1]);
    }

    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if !hi.is_finite() || hi - lo >= h {
        // One-sided update: the far axis cannot constrain the front.
        lo + h
    } else {
        let diff = hi - lo;
        0.5 * (lo + hi + (2.0 * h * h - diff * diff).sqrt())
    }
}

fn cardinal_neighbors(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let mut out = Vec::with_capacity(4);
    if row >= 1 {
        out.push((row - 1, col));
    }
    if row + 1 < rows {
        out.push((row + 1, col));
    }
    if col >= 1 {
        out.push((row, col - 1));
    }
    if col + 1 < cols {
        out.push((row, col + 1));
    }
    out.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_time_is_zero_and_grows_outward() {
        let mut system = System::new(5, 5).unwrap();
        system.place_target(Coord::new(0, 0)).unwrap();
        let t = solve_travel_time(&system, Coord::new(0, 0));
        let at = |r: usize, c: usize| t[r * 5 + c];
        assert_eq!(at(0, 0), 0.0);
        // Straight-line times grow by dx per cell at unit speed.
        assert!((at(0, 1) - 0.4).abs() < 1e-9);
        assert!((at(0, 2) - 0.8).abs() < 1e-9);
        // The two-axis update beats the Manhattan bound on the diagonal.
        assert!(at(1, 1) < at(0, 1) + 0.4);
        assert!(at(1, 1) > at(0, 1));
    }

    #[test]
    fn test_front_is_monotone_along_rows() {
        let mut system = System::new(4, 8).unwrap();
        system.place_target(Coord::new(2, 0)).unwrap();
        let t = solve_travel_time(&system, Coord::new(2, 0));
        for col in 1..8 {
            assert!(t[2 * 8 + col] > t[2 * 8 + col - 1]);
        }
    }

    #[test]
    fn test_obstacles_block_travel_time_but_not_distance() {
        let mut system = System::new(3, 5).unwrap();
        system.place_target(Coord::new(1, 0)).unwrap();
        for o in [Coord::new(0, 2), Coord::new(1, 2), Coord::new(2, 2)] {
            system.place_obstacle(o).unwrap();
        }
        let tt = solve_travel_time(&system, Coord::new(1, 0));
        let dist = solve_distance(&system, Coord::new(1, 0));
        let idx = |r: usize, c: usize| r * 5 + c;
        // Full wall: the right side is unreachable in the masked solve.
        assert!(tt[idx(1, 4)].is_infinite());
        assert!(tt[idx(1, 2)].is_infinite());
        // The unmasked distance field propagates straight through.
        assert!((dist[idx(1, 4)] - 4.0).abs() < 1e-9);
        assert!(dist[idx(1, 2)].is_finite());
    }

    #[test]
    fn test_faster_cells_reached_sooner() {
        let mut uniform = System::new(1, 6).unwrap();
        uniform.place_target(Coord::new(0, 0)).unwrap();
        let slow = solve_travel_time(&uniform, Coord::new(0, 0));

        let mut quick = System::new(1, 6).unwrap();
        quick.place_target(Coord::new(0, 0)).unwrap();
        for col in 0..6 {
            quick.set_speed(Coord::new(0, col), 2.0).unwrap();
        }
        let fast = solve_travel_time(&quick, Coord::new(0, 0));

        for col in 1..6 {
            assert!((fast[col] - slow[col] / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_speed_cell_is_impassable() {
        let mut system = System::new(1, 4).unwrap();
        system.place_target(Coord::new(0, 0)).unwrap();
        system.set_speed(Coord::new(0, 2), 0.0).unwrap();
        let t = solve_travel_time(&system, Coord::new(0, 0));
        assert!(t[2].is_infinite());
        assert!(t[3].is_infinite());
    }
}
