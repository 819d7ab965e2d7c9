#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Budgeted breadth-first motion planner.
//!
//! A [`MotionPlanner`] is allocated once per agent and reused for every
//! search. Each [`MotionPlanner::solve`] call runs one breadth-first search
//! from a source cell to the first popped cell satisfying an objective
//! predicate, expanding through three rings of candidate directions. Scratch arrays
//! are invalidated by bumping a run id rather than clearing them, so the cost
//! of a search is proportional to the cells it touches.

mod rings;

use gridwise_core::{BoardSize, BoundedQueue, Direction, Location};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::rings::{
    speed_mask, DIRECTIONS, MAX_TABLE_SPEED, OFF_GRID_GATE, REJECTED_GATE,
};

/// Caller-side movement budgets used when invoking the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Largest magnitude a single search hop may have.
    pub max_speed: u32,
    /// Largest magnitude a compressed movement step may have.
    pub preferred_speed: u32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            max_speed: 2,
            preferred_speed: 2,
        }
    }
}

/// Counters describing the most recent search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// States popped from the frontier and expanded.
    pub expanded: u32,
    /// Candidate directions actually probed.
    pub probes: u32,
    /// Candidate directions skipped because an earlier probe ruled them out.
    pub gated: u32,
    /// Discovered states the frontier had no room for.
    pub frontier_rejections: u32,
}

#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    location: Location,
    first_step: Direction,
}

/// Reusable breadth-first planner bound to a single board.
#[derive(Debug)]
pub struct MotionPlanner {
    size: BoardSize,
    run_id: u32,
    visited: Vec<u32>,
    came_from: Vec<Direction>,
    frontier: BoundedQueue<FrontierEntry>,
    solution: Vec<Direction>,
    destination: Option<Location>,
    first_step: Option<Direction>,
    stats: SearchStats,
}

impl MotionPlanner {
    /// Allocates the scratch state for a board of the provided size.
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        let cells = size.cell_count();
        Self {
            size,
            run_id: 0,
            visited: vec![0; cells],
            came_from: vec![Direction::ZERO; cells],
            frontier: BoundedQueue::with_capacity(cells),
            solution: Vec::new(),
            destination: None,
            first_step: None,
            stats: SearchStats::default(),
        }
    }

    /// Board the planner was allocated for.
    #[must_use]
    pub const fn size(&self) -> BoardSize {
        self.size
    }

    /// Searches for the nearest cell, in hops, satisfying `is_objective`.
    ///
    /// Each hop is a candidate direction whose magnitude does not exceed
    /// `max_speed` and whose target cell passes `can_enter`; the source itself
    /// is never tested against `can_enter`. The first objective popped from the
    /// frontier wins. On success the hop sequence is compressed so that
    /// consecutive hops merge while their sum stays within `preferred_speed`,
    /// and [`MotionPlanner::next_step`] drains the result. Finding nothing is
    /// the normal "no path" outcome and leaves the step stack empty.
    ///
    /// Speeds above the largest table magnitude behave like that magnitude.
    pub fn solve<O, E>(
        &mut self,
        source: Location,
        max_speed: u32,
        preferred_speed: u32,
        mut is_objective: O,
        mut can_enter: E,
    ) where
        O: FnMut(Location) -> bool,
        E: FnMut(Location) -> bool,
    {
        self.begin_run();

        let Some(source_index) = self.size.index(source) else {
            warn!(?source, "motion search requested from an off-board source");
            return;
        };

        if max_speed > MAX_TABLE_SPEED {
            trace!(max_speed, "clamping search speed to the ring table");
        }
        let live_mask = speed_mask(max_speed);

        self.visited[source_index] = self.run_id;
        self.came_from[source_index] = Direction::ZERO;
        self.enqueue(FrontierEntry {
            location: source,
            first_step: Direction::ZERO,
        });

        while let Some(entry) = self.frontier.pop() {
            if is_objective(entry.location) {
                self.destination = Some(entry.location);
                self.first_step = (!entry.first_step.is_zero()).then_some(entry.first_step);
                break;
            }

            self.expand(entry, live_mask, &mut can_enter);
        }

        if let Some(destination) = self.destination {
            self.reconstruct(source, destination, preferred_speed);
        }

        debug!(
            ?source,
            destination = ?self.destination,
            steps = self.solution.len(),
            expanded = self.stats.expanded,
            probes = self.stats.probes,
            gated = self.stats.gated,
            "motion search finished"
        );
    }

    /// Pops the next movement step of the last solved path.
    pub fn next_step(&mut self) -> Option<Direction> {
        self.solution.pop()
    }

    /// Number of movement steps not yet drained.
    #[must_use]
    pub fn remaining_steps(&self) -> usize {
        self.solution.len()
    }

    /// Reports whether the last search reached the location.
    #[must_use]
    pub fn was_visited(&self, location: Location) -> bool {
        self.run_id != 0
            && self
                .size
                .index(location)
                .is_some_and(|index| self.visited[index] == self.run_id)
    }

    /// Objective cell found by the last search, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<Location> {
        self.destination
    }

    /// First uncompressed hop from the source toward the destination.
    ///
    /// `None` when no destination was found or the source itself satisfied
    /// the objective.
    #[must_use]
    pub const fn first_step(&self) -> Option<Direction> {
        self.first_step
    }

    /// Counters gathered by the last search.
    #[must_use]
    pub const fn stats(&self) -> SearchStats {
        self.stats
    }

    fn begin_run(&mut self) {
        self.run_id = match self.run_id.checked_add(1) {
            Some(run_id) => run_id,
            None => {
                self.visited.fill(0);
                1
            }
        };
        self.frontier.clear();
        self.solution.clear();
        self.destination = None;
        self.first_step = None;
        self.stats = SearchStats::default();
    }

    fn enqueue(&mut self, entry: FrontierEntry) {
        if !self.frontier.push(entry) {
            self.stats.frontier_rejections += 1;
            debug!(location = ?entry.location, "frontier full, dropping discovered state");
        }
    }

    fn expand<E>(&mut self, entry: FrontierEntry, speed_mask: u32, can_enter: &mut E)
    where
        E: FnMut(Location) -> bool,
    {
        self.stats.expanded += 1;
        let mut live = speed_mask;

        for (index, &direction) in DIRECTIONS.iter().enumerate() {
            let bit = 1 << index;
            if live & bit == 0 {
                if speed_mask & bit != 0 {
                    self.stats.gated += 1;
                }
                continue;
            }

            self.stats.probes += 1;
            let target = self.size.add(entry.location, direction);
            let Some(target_index) = self.size.index(target) else {
                live &= OFF_GRID_GATE[index];
                continue;
            };

            if self.visited[target_index] == self.run_id || !can_enter(target) {
                live &= REJECTED_GATE[index];
                continue;
            }

            self.visited[target_index] = self.run_id;
            self.came_from[target_index] = direction;
            let first_step = if entry.first_step.is_zero() {
                direction
            } else {
                entry.first_step
            };
            self.enqueue(FrontierEntry {
                location: target,
                first_step,
            });
        }
    }

    fn reconstruct(&mut self, source: Location, destination: Location, preferred_speed: u32) {
        let mut cursor = destination;
        let mut remaining_hops = self.size.cell_count();

        while cursor != source {
            let Some(index) = self.size.index(cursor) else {
                break;
            };
            if remaining_hops == 0 {
                warn!(?source, ?destination, "path reconstruction did not reach the source");
                self.solution.clear();
                return;
            }
            remaining_hops -= 1;

            let hop = self.came_from[index];
            self.push_hop(hop, preferred_speed);
            cursor = self.size.add(cursor, -hop);
        }
    }

    fn push_hop(&mut self, hop: Direction, preferred_speed: u32) {
        if let Some(top) = self.solution.last_mut() {
            if let Some(merged) = top.checked_add(hop) {
                if merged.magnitude() <= preferred_speed {
                    *top = merged;
                    return;
                }
            }
        }
        self.solution.push(hop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(side: u32) -> BoardSize {
        BoardSize::new(side).expect("valid side")
    }

    fn drain(planner: &mut MotionPlanner) -> Vec<Direction> {
        std::iter::from_fn(|| planner.next_step()).collect()
    }

    #[test]
    fn source_satisfying_objective_yields_empty_path() {
        let size = board(4);
        let mut planner = MotionPlanner::new(size);
        let source = size.pack(2, 2);

        planner.solve(source, 2, 2, |cell| cell == source, |_| true);

        assert_eq!(planner.destination(), Some(source));
        assert_eq!(planner.first_step(), None);
        assert_eq!(planner.next_step(), None);
    }

    #[test]
    fn unreachable_objective_reports_no_step() {
        let size = board(5);
        let mut planner = MotionPlanner::new(size);
        let walled = |cell: Location| cell.x() != 2;

        planner.solve(size.pack(0, 0), 2, 2, |cell| cell.x() == 4, walled);

        assert_eq!(planner.destination(), None);
        assert_eq!(planner.next_step(), None);
        assert!(planner.was_visited(size.pack(1, 4)));
        assert!(!planner.was_visited(size.pack(3, 0)));
    }

    #[test]
    fn leap_crosses_a_one_cell_wall() {
        let size = board(5);
        let mut planner = MotionPlanner::new(size);
        let walled = |cell: Location| cell.x() != 2;

        planner.solve(size.pack(1, 2), 9, 9, |cell| cell.x() == 4, walled);

        assert_eq!(planner.destination(), Some(size.pack(4, 2)));
        assert_eq!(planner.first_step(), Some(Direction::new(3, 0)));
        assert_eq!(drain(&mut planner), vec![Direction::new(3, 0)]);
    }

    #[test]
    fn hops_merge_up_to_preferred_speed() {
        let size = board(8);
        let mut planner = MotionPlanner::new(size);
        let source = size.pack(0, 3);
        let goal = size.pack(6, 3);

        planner.solve(source, 1, 4, |cell| cell == goal, |cell| cell.y() == 3);

        assert_eq!(planner.stats().frontier_rejections, 0);
        assert_eq!(planner.first_step(), Some(Direction::new(1, 0)));
        assert_eq!(
            drain(&mut planner),
            vec![
                Direction::new(2, 0),
                Direction::new(2, 0),
                Direction::new(2, 0)
            ]
        );
    }

    #[test]
    fn run_id_wraparound_resets_visit_stamps() {
        let size = board(3);
        let mut planner = MotionPlanner::new(size);
        planner.solve(size.pack(0, 0), 2, 2, |_| false, |_| true);
        assert!(planner.was_visited(size.pack(2, 2)));

        planner.run_id = u32::MAX;
        planner.solve(size.pack(0, 0), 2, 2, |_| false, |cell| cell.x() == 0);

        assert_eq!(planner.run_id, 1);
        assert!(planner.was_visited(size.pack(0, 2)));
        assert!(!planner.was_visited(size.pack(2, 2)));
    }

    #[test]
    fn nothing_is_visited_before_the_first_search() {
        let size = board(3);
        let planner = MotionPlanner::new(size);
        assert!(!planner.was_visited(size.pack(0, 0)));
    }

    #[test]
    fn gating_skips_probes_along_the_edge() {
        let size = board(6);
        let mut planner = MotionPlanner::new(size);

        planner.solve(size.pack(5, 0), 9, 9, |_| false, |_| true);

        let stats = planner.stats();
        assert_eq!(stats.expanded, 36);
        assert!(stats.gated > 0, "edge cells should prune leaps: {stats:?}");
        assert_eq!(stats.probes + stats.gated, 36 * 28);
    }
}
