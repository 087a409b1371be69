//! Core type definitions used throughout the simulator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinate, row-major identity of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Euclidean distance between cell centers
    ///
    /// Adjacent cardinal cells are 1 apart, diagonal cells sqrt(2).
    pub fn distance(&self, other: &Self) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// What currently occupies a cell
///
/// Exactly one state per cell; pedestrians, the target and obstacles
/// are mutually exclusive occupants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Empty,
    Pedestrian,
    Target,
    Obstacle,
}

/// Movement policy selecting how pedestrians pick their next cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Obstacle-aware shortest-path utility field plus repulsion potential
    Dijkstra,
    /// Straight-line distance descent, obstacle-agnostic field
    Euclidean,
    /// Continuous travel-time minimization with congestion weighting
    FastMarching,
}

/// Per-pedestrian outcome of one tick
///
/// Returned by `System::advance_tick` so front-ends can render deltas
/// without diffing the whole grid.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// Pedestrian moved from one cell to an adjacent one
    Moved { from: Coord, to: Coord },
    /// Pedestrian stayed in place this tick (blocked or no better cell)
    Waiting { at: Coord },
    /// Pedestrian reached the target and left the active set
    Arrived { from: Coord },
}
