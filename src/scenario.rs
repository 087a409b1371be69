//! Scenario files: the loader collaborator at the core's boundary
//!
//! Scenarios describe a starting grid as plain JSON: dimensions,
//! pedestrian/obstacle/target coordinates, optional per-pedestrian speeds
//! (placement order) and an optional display scale for graphical
//! front-ends. The core only ever sees the already-parsed values through
//! its placement API.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::Result;
use crate::core::types::Coord;
use crate::grid::System;

/// A parsed scenario file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    pub rows: usize,
    pub cols: usize,
    /// Pedestrian coordinates as `[row, col]` pairs
    #[serde(default)]
    pub pedestrians: Vec<[usize; 2]>,
    /// Personal speeds matched to `pedestrians` by position; shorter
    /// lists leave the remaining pedestrians at speed 1
    #[serde(default)]
    pub speeds: Vec<f64>,
    #[serde(default)]
    pub obstacles: Vec<[usize; 2]>,
    pub target: [usize; 2],
    /// Cell edge length in pixels, a hint for graphical front-ends
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
}

fn default_cell_size() -> u32 {
    5
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Builds a `System` with every placement applied. Pedestrians are
    /// placed first (so speed assignment follows placement order), then
    /// obstacles, then the target.
    pub fn apply(&self) -> Result<System> {
        let mut system = System::new(self.rows, self.cols)?;
        for &[row, col] in &self.pedestrians {
            system.place_pedestrian(Coord::new(row, col))?;
        }
        system.initialize_speeds(&self.speeds);
        for &[row, col] in &self.obstacles {
            system.place_obstacle(Coord::new(row, col))?;
        }
        system.place_target(Coord::new(self.target[0], self.target[1]))?;
        Ok(system)
    }
}
