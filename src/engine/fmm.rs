//! Continuous travel-time engine
//!
//! Pedestrians descend a congestion-weighted copy of the cached Eikonal
//! travel-time field instead of a discrete utility field. Occupied cells
//! are inflated so crowded regions read as slower; a blocked pedestrian
//! accumulates patience (its wait penalty) until the way clears. Elapsed
//! travel time and the spawn-time arrival prediction ride along with each
//! pedestrian for reporting.

use crate::core::error::{Result, SimError};
use crate::core::types::{CellState, TickEvent};
use crate::engine::marching::{self, FmmFields};
use crate::grid::system::System;

/// Solves and caches the travel-time and distance fields on first use,
/// seeding every current pedestrian's arrival prediction from the
/// unweighted distance field. Subsequent calls are no-ops until the
/// obstacle set changes.
pub fn ensure_fields(system: &mut System) -> Result<()> {
    if system.fmm_fields.is_some() {
        return Ok(());
    }
    let target = system.target.ok_or(SimError::NoTarget)?;

    let travel_time = marching::solve_travel_time(system, target);
    let distance = marching::solve_distance(system, target);

    let pedestrians = system.pedestrians.clone();
    for ped in pedestrians {
        let d = distance[system.index(ped)];
        let cell = system.cell_mut(ped);
        cell.initial_predicted_time = if cell.speed > 0.0 {
            d / cell.speed
        } else {
            f64::INFINITY
        };
    }

    tracing::debug!(target = %target, "travel-time fields solved");
    system.fmm_fields = Some(FmmFields {
        travel_time,
        distance,
    });
    Ok(())
}

/// One tick of the continuous engine.
///
/// Pedestrians resolve sequentially against live occupancy: each takes the
/// masked travel-time field, inflates every *other* pedestrian's cell by
/// its occupant's patience-driven congestion factor, and steps to the
/// adjacent cell with the smallest value. A choice blocked by another
/// pedestrian raises the blocked pedestrian's wait penalty instead of
/// moving; a choice equal to the target absorbs the pedestrian.
pub fn advance(system: &mut System) -> Result<Vec<TickEvent>> {
    ensure_fields(system)?;
    let target = system.target.ok_or(SimError::NoTarget)?;

    // Working copy with the obstacle mask re-applied: obstacles may have
    // changed residual cost without invalidating the cached solve.
    let mut base = system
        .fmm_fields
        .as_ref()
        .expect("fields ensured above")
        .travel_time
        .clone();
    for obstacle in system.obstacles.clone() {
        let idx = system.index(obstacle);
        base[idx] = f64::INFINITY;
    }

    let gain = system.config.congestion_gain;
    let wait_increment = system.config.wait_increment;
    let default_speed = system.config.default_speed;

    let mut events = Vec::new();
    let roster = system.pedestrians.clone();
    for ped in roster {
        let mut working = base.clone();
        for &other in &system.pedestrians {
            if other == ped {
                continue;
            }
            let idx = system.index(other);
            let v = working[idx];
            if v.is_finite() && v > 0.0 {
                let w = system.cell(other).wait_penalty;
                working[idx] = v * (w * (1.0 + gain / v) + 1.0 / v);
            }
        }

        // Adjacency order breaks ties, first candidate wins.
        let mut choice = None;
        for &candidate in system.adjacent(ped) {
            let v = working[system.index(candidate)];
            if choice.map_or(true, |(_, best)| v < best) {
                choice = Some((candidate, v));
            }
        }
        let Some((choice, value)) = choice else {
            continue; // single-cell grid
        };

        if !value.is_finite() || system.cell(choice).state == CellState::Obstacle {
            // Sealed in. Nothing to be patient about, just stuck.
            events.push(TickEvent::Waiting { at: ped });
            continue;
        }

        if system.cell(choice).state == CellState::Pedestrian {
            let cell = system.cell_mut(ped);
            cell.wait_penalty += wait_increment;
            tracing::debug!(
                pedestrian = %ped,
                wait_penalty = cell.wait_penalty,
                "blocked, patience raised"
            );
            events.push(TickEvent::Waiting { at: ped });
            continue;
        }

        if choice == target {
            let cell = system.cell_mut(ped);
            let travel_time = cell.travel_time;
            let predicted = cell.initial_predicted_time;
            cell.state = CellState::Empty;
            cell.reset_occupant(default_speed);
            system.pedestrians.retain(|&p| p != ped);
            tracing::debug!(
                pedestrian = %ped,
                travel_time,
                predicted,
                "absorbed at target"
            );
            events.push(TickEvent::Arrived { from: ped });
            continue;
        }

        let (speed, travel_time, predicted, wait_penalty) = {
            let src = system.cell(ped);
            let step = if src.speed > 0.0 {
                ped.distance(&choice) / src.speed
            } else {
                f64::INFINITY
            };
            (
                src.speed,
                src.travel_time + step,
                src.initial_predicted_time,
                src.wait_penalty,
            )
        };
        {
            let src = system.cell_mut(ped);
            src.state = CellState::Empty;
            src.reset_occupant(default_speed);
        }
        {
            let dst = system.cell_mut(choice);
            dst.state = CellState::Pedestrian;
            dst.travel_time = travel_time;
            dst.initial_predicted_time = predicted;
            dst.wait_penalty = wait_penalty;
            dst.speed = speed;
        }
        // Replace in place so processing order stays the placement order.
        if let Some(slot) = system.pedestrians.iter_mut().find(|p| **p == ped) {
            *slot = choice;
        }
        events.push(TickEvent::Moved { from: ped, to: choice });
    }

    for &ped in &system.pedestrians {
        let cell = system.cell(ped);
        tracing::trace!(
            pedestrian = %ped,
            travel_time = cell.travel_time,
            predicted = cell.initial_predicted_time,
            "tick progress"
        );
    }
    Ok(events)
}
