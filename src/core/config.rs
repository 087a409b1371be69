//! Simulation constants with documented provenance
//!
//! All magic numbers of the movement models are collected here. The
//! congestion and patience constants are behavioral contracts of the
//! fast-marching engine and are not meant to be re-derived.

/// Tunable constants for the three movement models
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    // === INTERACTION POTENTIAL ===
    /// Support radius of the pedestrian repulsion kernel (cells)
    ///
    /// Cells strictly closer than this to a pedestrian receive the
    /// additive penalty `exp(1 / (d^2 - r_max^2))`; cells at or beyond
    /// it receive none. The kernel diverges to 0 at the boundary, so the
    /// potential is smooth over its whole support.
    pub r_max: f64,

    // === FAST-MARCHING ENGINE ===
    /// Grid spacing used by the travel-time Eikonal solve
    ///
    /// Travel time is solved on a 0.4-unit lattice; the geometric
    /// distance field stays on a unit lattice.
    pub travel_time_dx: f64,

    /// Grid spacing used by the geometric distance solve
    pub distance_dx: f64,

    /// Added to a pedestrian's wait penalty for each tick it is blocked
    ///
    /// Patience accumulates slowly: a pedestrian blocked for n ticks
    /// carries a penalty of 1 + n * increment into the congestion
    /// weighting.
    pub wait_increment: f64,

    /// Gain of the congestion inflation at an occupied cell
    ///
    /// An occupied cell's working value v becomes
    /// `v * (w * (1 + gain / v) + 1 / v)` where w is the occupant's wait
    /// penalty. Both the formula and the gain of 10 are tuned behavioral
    /// contracts, not derived quantities.
    pub congestion_gain: f64,

    /// Personal speed assigned to pedestrians with no explicit speed
    pub default_speed: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            r_max: 2.0,
            travel_time_dx: 0.4,
            distance_dx: 1.0,
            wait_increment: 0.001,
            congestion_gain: 10.0,
            default_speed: 1.0,
        }
    }
}
