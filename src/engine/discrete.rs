//! Discrete per-tick movement resolution
//!
//! Both discrete policies run two-phase: every pedestrian's destination is
//! decided against one consistent snapshot of occupancy and utilities, then
//! all moves are applied. A destination claimed by an earlier pedestrian is
//! off limits for the rest of the tick, so no commit can double-book a cell.

use std::collections::HashSet;

use crate::core::types::{CellState, Coord, TickEvent};
use crate::fields::potential;
use crate::grid::system::System;

/// One tick of the shortest-path policy: repulsion potential on top of the
/// Dijkstra utility field, candidates exclude obstacles structurally.
pub fn advance_dijkstra(system: &mut System) -> Vec<TickEvent> {
    potential::apply(system);
    let decisions = decide(system, CandidateRule::ShortestPath);
    potential::reset(system);
    commit(system, decisions)
}

/// One tick of the greedy policy: raw straight-line utilities, no
/// interaction potential. Obstacles stay in the candidate list; a
/// pedestrian whose best candidate is an obstacle freezes for the tick.
/// The freeze is part of this policy's contract, not an oversight.
pub fn advance_euclidean(system: &mut System) -> Vec<TickEvent> {
    let decisions = decide(system, CandidateRule::Greedy);
    commit(system, decisions)
}

#[derive(Clone, Copy)]
enum CandidateRule {
    ShortestPath,
    Greedy,
}

impl CandidateRule {
    fn score(&self, system: &System, coord: Coord) -> f64 {
        match self {
            CandidateRule::ShortestPath => system.cell(coord).total_utility(),
            CandidateRule::Greedy => system.cell(coord).distance_utility,
        }
    }
}

/// Decision phase. Reads only tick-start state: cell states are not
/// mutated here, and the claim set supplies the intra-tick exclusions.
fn decide(system: &mut System, rule: CandidateRule) -> Vec<(Coord, Coord)> {
    let pedestrians = system.pedestrians.clone();
    let mut claimed: HashSet<Coord> = HashSet::new();
    let mut decisions = Vec::with_capacity(pedestrians.len());

    for ped in pedestrians {
        let candidates = match rule {
            CandidateRule::ShortestPath => system.adjacent_minus_obstacles(ped),
            CandidateRule::Greedy => system.adjacent(ped).to_vec(),
        };

        let mut best = ped;
        let mut best_score = rule.score(system, ped);
        for candidate in candidates {
            if claimed.contains(&candidate) {
                continue;
            }
            if system.cell(candidate).state == CellState::Pedestrian {
                continue;
            }
            let score = rule.score(system, candidate);
            if score < best_score {
                best = candidate;
                best_score = score;
            }
        }

        if matches!(rule, CandidateRule::Greedy)
            && system.cell(best).state == CellState::Obstacle
        {
            best = ped;
        }

        if best != ped {
            claimed.insert(best);
        }
        system.cell_mut(ped).next_cell = Some(best);
        decisions.push((ped, best));
    }
    decisions
}

/// Commit phase: single writer over the grid. Vacated cells become empty,
/// destinations become pedestrians, and a pedestrian whose destination is
/// the target is absorbed instead of moved onto it.
fn commit(system: &mut System, decisions: Vec<(Coord, Coord)>) -> Vec<TickEvent> {
    let target = system.target;
    let default_speed = system.config.default_speed;
    let mut events = Vec::with_capacity(decisions.len());
    let mut survivors = Vec::with_capacity(decisions.len());

    for (from, to) in decisions {
        if to == from {
            events.push(TickEvent::Waiting { at: from });
            survivors.push(from);
            continue;
        }

        system.cell_mut(from).state = CellState::Empty;
        if Some(to) == target {
            system.cell_mut(from).reset_occupant(default_speed);
            tracing::debug!(pedestrian = %from, "absorbed at target");
            events.push(TickEvent::Arrived { from });
            continue;
        }

        system.cell_mut(to).state = CellState::Pedestrian;
        events.push(TickEvent::Moved { from, to });
        survivors.push(to);
    }

    system.pedestrians = survivors;
    events
}
