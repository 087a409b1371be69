//! Grid ownership, placement boundary and policy dispatch
//!
//! The `System` owns every cell, validates all placements synchronously,
//! and exposes one blocking `advance_tick` per movement policy. Utility
//! fields are evaluated lazily before the first tick of a policy and kept
//! until placements or the requested policy change.

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{CellState, Coord, Policy, TickEvent};
use crate::engine;
use crate::engine::marching::FmmFields;
use crate::fields;
use crate::grid::cell::Cell;

pub struct System {
    rows: usize,
    cols: usize,
    pub(crate) cells: Vec<Cell>,
    /// Active pedestrian cells, in placement order, no duplicates.
    pub(crate) pedestrians: Vec<Coord>,
    pub(crate) target: Option<Coord>,
    pub(crate) obstacles: Vec<Coord>,
    /// Per-cell propagation speed for the Eikonal solve, default 1.
    pub(crate) speed_field: Vec<f64>,
    pub(crate) config: SimulationConfig,
    /// Which solver last populated `distance_utility`, if any.
    pub(crate) field_policy: Option<Policy>,
    /// Cached travel-time/distance fields for the continuous engine.
    pub(crate) fmm_fields: Option<FmmFields>,
}

impl System {
    /// Builds an empty grid and caches every cell's adjacency list.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::with_config(rows, cols, SimulationConfig::default())
    }

    pub fn with_config(rows: usize, cols: usize, config: SimulationConfig) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(SimError::InvalidDimensions { rows, cols });
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(Coord::new(row, col), config.default_speed));
            }
        }
        for cell in &mut cells {
            cell.adjacent_cells = neighbors(cell.coord, rows, cols);
        }

        Ok(Self {
            rows,
            cols,
            cells,
            pedestrians: Vec::new(),
            target: None,
            obstacles: Vec::new(),
            speed_field: vec![1.0; rows * cols],
            config,
            field_policy: None,
            fmm_fields: None,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    #[inline]
    pub(crate) fn index(&self, coord: Coord) -> usize {
        coord.row * self.cols + coord.col
    }

    #[inline]
    pub(crate) fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[coord.row * self.cols + coord.col]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        &mut self.cells[coord.row * self.cols + coord.col]
    }

    // === Placement boundary ===

    /// Marks a cell as holding a pedestrian.
    pub fn place_pedestrian(&mut self, coord: Coord) -> Result<()> {
        self.claim_empty(coord)?;
        let default_speed = self.config.default_speed;
        let cell = self.cell_mut(coord);
        cell.state = CellState::Pedestrian;
        cell.reset_occupant(default_speed);
        self.pedestrians.push(coord);
        Ok(())
    }

    /// Marks a cell as an obstacle. Invalidates cached fields: obstacles
    /// change both the shortest-path graph and the Eikonal mask.
    pub fn place_obstacle(&mut self, coord: Coord) -> Result<()> {
        self.claim_empty(coord)?;
        self.cell_mut(coord).state = CellState::Obstacle;
        self.obstacles.push(coord);
        self.field_policy = None;
        self.fmm_fields = None;
        Ok(())
    }

    /// Marks the single target cell. A second target is rejected.
    pub fn place_target(&mut self, coord: Coord) -> Result<()> {
        if let Some(existing) = self.target {
            return Err(SimError::CellOccupied {
                coord: existing,
                state: CellState::Target,
            });
        }
        self.claim_empty(coord)?;
        self.cell_mut(coord).state = CellState::Target;
        self.target = Some(coord);
        self.field_policy = None;
        self.fmm_fields = None;
        Ok(())
    }

    /// Removes a pedestrian and resets its cell to empty.
    pub fn remove_pedestrian(&mut self, coord: Coord) -> Result<()> {
        let pos = self
            .pedestrians
            .iter()
            .position(|&p| p == coord)
            .ok_or(SimError::MissingPedestrian { coord })?;
        self.pedestrians.remove(pos);
        let default_speed = self.config.default_speed;
        let cell = self.cell_mut(coord);
        cell.state = CellState::Empty;
        cell.reset_occupant(default_speed);
        Ok(())
    }

    fn claim_empty(&mut self, coord: Coord) -> Result<()> {
        if !self.contains(coord) {
            return Err(SimError::OutOfBounds {
                coord,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let state = self.cell(coord).state;
        if state != CellState::Empty {
            return Err(SimError::CellOccupied { coord, state });
        }
        Ok(())
    }

    // === Speeds ===

    /// Sets the propagation speed of one cell. When a pedestrian occupies
    /// the cell, its personal speed is refreshed as well. Negative values
    /// are clamped to 0 (an impassable cell for the Eikonal solve).
    pub fn set_speed(&mut self, coord: Coord, value: f64) -> Result<()> {
        if !self.contains(coord) {
            return Err(SimError::OutOfBounds {
                coord,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let value = value.max(0.0);
        let idx = self.index(coord);
        self.speed_field[idx] = value;
        if self.cells[idx].state == CellState::Pedestrian {
            self.cells[idx].speed = value;
        }
        Ok(())
    }

    /// Assigns personal speeds to pedestrians in placement order;
    /// pedestrians beyond the slice keep the default of 1.
    pub fn initialize_speeds(&mut self, speeds: &[f64]) {
        let default_speed = self.config.default_speed;
        let pedestrians = self.pedestrians.clone();
        for (i, coord) in pedestrians.into_iter().enumerate() {
            let speed = speeds.get(i).copied().unwrap_or(default_speed).max(0.0);
            self.cell_mut(coord).speed = speed;
        }
    }

    // === Adjacency ===

    /// Cached neighbors of a cell, boundary-clipped.
    /// Order: S, SE, SW, N, NE, NW, E, W.
    pub fn adjacent(&self, coord: Coord) -> &[Coord] {
        &self.cell(coord).adjacent_cells
    }

    /// Neighbors with obstacle cells filtered out.
    pub fn adjacent_minus_obstacles(&self, coord: Coord) -> Vec<Coord> {
        self.cell(coord)
            .adjacent_cells
            .iter()
            .copied()
            .filter(|&c| self.cell(c).state != CellState::Obstacle)
            .collect()
    }

    /// Non-obstacle cells in the Chebyshev box of half-width `r_max`
    /// around a pedestrian; the support scanned by the repulsion kernel.
    pub(crate) fn interaction_zone(&self, coord: Coord) -> Vec<Coord> {
        let r = self.config.r_max.ceil() as usize;
        let row_lo = coord.row.saturating_sub(r);
        let row_hi = (coord.row + r + 1).min(self.rows);
        let col_lo = coord.col.saturating_sub(r);
        let col_hi = (coord.col + r + 1).min(self.cols);
        let mut zone = Vec::new();
        for row in row_lo..row_hi {
            for col in col_lo..col_hi {
                let c = Coord::new(row, col);
                if self.cell(c).state != CellState::Obstacle {
                    zone.push(c);
                }
            }
        }
        zone
    }

    // === Field evaluation and ticking ===

    /// Populates `distance_utility` (or the cached travel-time fields for
    /// the continuous engine) for the given policy. Lazy and idempotent:
    /// re-evaluating with unchanged placements reproduces identical values.
    pub fn evaluate_utility_field(&mut self, policy: Policy) -> Result<()> {
        match policy {
            Policy::Dijkstra => fields::dijkstra::solve(self)?,
            Policy::Euclidean => fields::euclidean::solve(self)?,
            Policy::FastMarching => engine::fmm::ensure_fields(self)?,
        }
        self.field_policy = Some(policy);
        Ok(())
    }

    /// Advances the simulation one tick under the given policy.
    ///
    /// Evaluates the policy's utility field first if it is not the one
    /// currently populating the grid. Never fails on a well-formed grid
    /// with a target placed.
    pub fn advance_tick(&mut self, policy: Policy) -> Result<Vec<TickEvent>> {
        if self.field_policy != Some(policy) {
            self.evaluate_utility_field(policy)?;
        }
        match policy {
            Policy::Dijkstra => Ok(engine::discrete::advance_dijkstra(self)),
            Policy::Euclidean => Ok(engine::discrete::advance_euclidean(self)),
            Policy::FastMarching => engine::fmm::advance(self),
        }
    }

    // === Read-only snapshot for rendering ===

    pub fn state_at(&self, coord: Coord) -> Option<CellState> {
        self.contains(coord).then(|| self.cell(coord).state)
    }

    pub fn cell_at(&self, coord: Coord) -> Option<&Cell> {
        self.contains(coord).then(|| self.cell(coord))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn pedestrians(&self) -> &[Coord] {
        &self.pedestrians
    }

    pub fn target(&self) -> Option<Coord> {
        self.target
    }

    pub fn obstacles(&self) -> &[Coord] {
        &self.obstacles
    }

    /// One character per cell: `.` empty, `P` pedestrian, `T` target,
    /// `#` obstacle. Rows separated by newlines.
    pub fn ascii_map(&self) -> String {
        let mut out = String::with_capacity((self.cols + 1) * self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                out.push(match self.cell(Coord::new(row, col)).state {
                    CellState::Empty => '.',
                    CellState::Pedestrian => 'P',
                    CellState::Target => 'T',
                    CellState::Obstacle => '#',
                });
            }
            out.push('\n');
        }
        out
    }

    pub fn distance_utilities_dump(&self) -> String {
        self.dump_with(|cell| cell.distance_utility)
    }

    pub fn pedestrian_utilities_dump(&self) -> String {
        self.dump_with(|cell| cell.pedestrian_utility)
    }

    pub fn total_utilities_dump(&self) -> String {
        self.dump_with(|cell| cell.total_utility())
    }

    fn dump_with(&self, value: impl Fn(&Cell) -> f64) -> String {
        let mut out = String::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let v = value(self.cell(Coord::new(row, col)));
                if v.is_infinite() {
                    out.push_str("  MAX ");
                } else {
                    out.push_str(&format!("{:05.2} ", v));
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Boundary-clipped neighbor list in the canonical candidate order:
/// south row first (S, SE, SW), then north row (N, NE, NW), then E, W.
/// The order doubles as the tie-break for equal-utility candidates.
fn neighbors(coord: Coord, rows: usize, cols: usize) -> Vec<Coord> {
    let Coord { row, col } = coord;
    let mut adjacent = Vec::with_capacity(8);
    if row + 1 < rows {
        adjacent.push(Coord::new(row + 1, col));
        if col + 1 < cols {
            adjacent.push(Coord::new(row + 1, col + 1));
        }
        if col >= 1 {
            adjacent.push(Coord::new(row + 1, col - 1));
        }
    }
    if row >= 1 {
        adjacent.push(Coord::new(row - 1, col));
        if col + 1 < cols {
            adjacent.push(Coord::new(row - 1, col + 1));
        }
        if col >= 1 {
            adjacent.push(Coord::new(row - 1, col - 1));
        }
    }
    if col + 1 < cols {
        adjacent.push(Coord::new(row, col + 1));
    }
    if col >= 1 {
        adjacent.push(Coord::new(row, col - 1));
    }
    adjacent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            System::new(0, 5),
            Err(SimError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            System::new(5, 0),
            Err(SimError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_adjacency_order_interior_cell() {
        let system = System::new(3, 3).unwrap();
        let adj = system.adjacent(Coord::new(1, 1));
        let expected = [
            Coord::new(2, 1), // S
            Coord::new(2, 2), // SE
            Coord::new(2, 0), // SW
            Coord::new(0, 1), // N
            Coord::new(0, 2), // NE
            Coord::new(0, 0), // NW
            Coord::new(1, 2), // E
            Coord::new(1, 0), // W
        ];
        assert_eq!(adj, expected);
    }

    #[test]
    fn test_adjacency_clipped_at_corner() {
        let system = System::new(3, 3).unwrap();
        let adj = system.adjacent(Coord::new(0, 0));
        assert_eq!(
            adj,
            [Coord::new(1, 0), Coord::new(1, 1), Coord::new(0, 1)]
        );
        for c in adj {
            assert!(system.contains(*c));
        }
    }

    #[test]
    fn test_placement_rejects_out_of_bounds() {
        let mut system = System::new(4, 4).unwrap();
        assert!(matches!(
            system.place_pedestrian(Coord::new(4, 0)),
            Err(SimError::OutOfBounds { .. })
        ));
        assert!(matches!(
            system.place_obstacle(Coord::new(0, 9)),
            Err(SimError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_placement_rejects_occupied_cell() {
        let mut system = System::new(4, 4).unwrap();
        system.place_pedestrian(Coord::new(1, 1)).unwrap();
        let err = system.place_obstacle(Coord::new(1, 1)).unwrap_err();
        assert!(matches!(
            err,
            SimError::CellOccupied {
                state: CellState::Pedestrian,
                ..
            }
        ));
    }

    #[test]
    fn test_single_target_enforced() {
        let mut system = System::new(4, 4).unwrap();
        system.place_target(Coord::new(0, 0)).unwrap();
        assert!(system.place_target(Coord::new(3, 3)).is_err());
        assert_eq!(system.target(), Some(Coord::new(0, 0)));
    }

    #[test]
    fn test_remove_pedestrian_resets_cell() {
        let mut system = System::new(4, 4).unwrap();
        system.place_pedestrian(Coord::new(2, 2)).unwrap();
        system.remove_pedestrian(Coord::new(2, 2)).unwrap();
        assert_eq!(system.state_at(Coord::new(2, 2)), Some(CellState::Empty));
        assert!(system.pedestrians().is_empty());
        assert!(matches!(
            system.remove_pedestrian(Coord::new(2, 2)),
            Err(SimError::MissingPedestrian { .. })
        ));
    }

    #[test]
    fn test_adjacent_minus_obstacles_filters() {
        let mut system = System::new(3, 3).unwrap();
        system.place_obstacle(Coord::new(1, 2)).unwrap();
        let adj = system.adjacent_minus_obstacles(Coord::new(1, 1));
        assert!(!adj.contains(&Coord::new(1, 2)));
        assert_eq!(adj.len(), 7);
    }

    #[test]
    fn test_interaction_zone_clips_and_skips_obstacles() {
        let mut system = System::new(5, 5).unwrap();
        system.place_obstacle(Coord::new(0, 1)).unwrap();
        let zone = system.interaction_zone(Coord::new(0, 0));
        // 3x3 corner box minus the obstacle
        assert_eq!(zone.len(), 8);
        assert!(!zone.contains(&Coord::new(0, 1)));
        assert!(zone.contains(&Coord::new(0, 0)));
    }

    #[test]
    fn test_set_speed_updates_field_and_occupant() {
        let mut system = System::new(3, 3).unwrap();
        system.place_pedestrian(Coord::new(1, 1)).unwrap();
        system.set_speed(Coord::new(1, 1), 1.4).unwrap();
        assert_eq!(system.cell(Coord::new(1, 1)).speed, 1.4);
        let idx = system.index(Coord::new(1, 1));
        assert_eq!(system.speed_field[idx], 1.4);
        assert!(system.set_speed(Coord::new(9, 9), 1.0).is_err());
    }

    #[test]
    fn test_initialize_speeds_pads_with_default() {
        let mut system = System::new(3, 3).unwrap();
        system.place_pedestrian(Coord::new(0, 0)).unwrap();
        system.place_pedestrian(Coord::new(0, 1)).unwrap();
        system.place_pedestrian(Coord::new(0, 2)).unwrap();
        system.initialize_speeds(&[1.2, 0.8]);
        assert_eq!(system.cell(Coord::new(0, 0)).speed, 1.2);
        assert_eq!(system.cell(Coord::new(0, 1)).speed, 0.8);
        assert_eq!(system.cell(Coord::new(0, 2)).speed, 1.0);
    }

    #[test]
    fn test_ascii_map_layout() {
        let mut system = System::new(2, 3).unwrap();
        system.place_target(Coord::new(0, 0)).unwrap();
        system.place_obstacle(Coord::new(0, 2)).unwrap();
        system.place_pedestrian(Coord::new(1, 1)).unwrap();
        assert_eq!(system.ascii_map(), "T.#\n.P.\n");
    }
}
