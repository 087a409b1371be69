use thiserror::Error;

use crate::core::types::{CellState, Coord};

/// Errors surfaced at the placement/configuration boundary.
///
/// Field solves and tick advancement on a well-formed grid never fail;
/// malformed input is rejected here, not discovered mid-simulation. An
/// unreachable pedestrian (utility stuck at +inf after the shortest-path
/// solve) is a steady-state condition, not an error: it simply never moves.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid grid dimensions {rows}x{cols}: both must be at least 1")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("coordinate {coord} outside {rows}x{cols} grid")]
    OutOfBounds { coord: Coord, rows: usize, cols: usize },

    #[error("cell {coord} already occupied ({state:?})")]
    CellOccupied { coord: Coord, state: CellState },

    #[error("no target placed")]
    NoTarget,

    #[error("no pedestrian at {coord}")]
    MissingPedestrian { coord: Coord },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("scenario parse error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
