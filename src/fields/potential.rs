//! Pedestrian repulsion potential
//!
//! A compactly supported bump kernel around each pedestrian discourages
//! others from funneling through the same region. The potential exists
//! only inside one resolution pass: `apply` rebuilds it from the current
//! pedestrian set, `reset` zeroes the same support right after the pass,
//! so nothing leaks into the next tick's base utilities.

use crate::grid::system::System;

/// Adds `exp(1 / (d^2 - r_max^2))` to every non-obstacle cell strictly
/// within `r_max` of each pedestrian. Contributions from several
/// pedestrians accumulate.
pub fn apply(system: &mut System) {
    let r_max = system.config.r_max;
    let pedestrians = system.pedestrians.clone();
    for ped in pedestrians {
        for coord in system.interaction_zone(ped) {
            let d = ped.distance(&coord);
            if d < r_max {
                system.cell_mut(coord).pedestrian_utility += bump(d, r_max);
            }
        }
    }
}

/// Zeroes the potential over every pedestrian's support. Must be called
/// with the same pedestrian set `apply` saw.
pub fn reset(system: &mut System) {
    let pedestrians = system.pedestrians.clone();
    for ped in pedestrians {
        for coord in system.interaction_zone(ped) {
            system.cell_mut(coord).pedestrian_utility = 0.0;
        }
    }
}

fn bump(d: f64, r_max: f64) -> f64 {
    (1.0 / (d * d - r_max * r_max)).exp()
}
