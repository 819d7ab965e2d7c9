//! Candidate direction tables for the multi-ring expansion.
//!
//! Directions are grouped into three rings of increasing magnitude. The
//! planner probes them in table order and narrows a live bitmask as probes
//! fail; the gate tables below say which later directions survive a failure.
//! The off-grid table is derived from board geometry at compile time. The
//! entry-rejection table is neutral: it keeps every direction, so masking with
//! it never narrows the live set.

use gridwise_core::Direction;

/// Number of candidate directions across all rings.
pub(crate) const DIRECTION_COUNT: usize = 28;

/// Largest magnitude the tables cover exhaustively.
pub(crate) const MAX_TABLE_SPEED: u32 = 9;

/// Bitmask with one bit per candidate direction.
pub(crate) const ALL_DIRECTIONS: u32 = (1 << DIRECTION_COUNT) - 1;

/// Table offsets where each ring begins, followed by the table length.
const RING_BOUNDS: [usize; 4] = [0, 8, 24, DIRECTION_COUNT];

const fn d(dx: i8, dy: i8) -> Direction {
    Direction::new(dx, dy)
}

/// Candidate directions ordered ring by ring.
pub(crate) const DIRECTIONS: [Direction; DIRECTION_COUNT] = [
    // ring 0: unit steps, magnitude 1 or 2
    d(0, 1),
    d(1, 1),
    d(1, 0),
    d(1, -1),
    d(0, -1),
    d(-1, -1),
    d(-1, 0),
    d(-1, 1),
    // ring 1: magnitude 4, 5 and 8
    d(0, 2),
    d(2, 0),
    d(0, -2),
    d(-2, 0),
    d(1, 2),
    d(2, 1),
    d(2, -1),
    d(1, -2),
    d(-1, -2),
    d(-2, -1),
    d(-2, 1),
    d(-1, 2),
    d(2, 2),
    d(2, -2),
    d(-2, -2),
    d(-2, 2),
    // ring 2: axis leaps, magnitude 9
    d(0, 3),
    d(3, 0),
    d(0, -3),
    d(-3, 0),
];

/// Directions still worth probing after `DIRECTIONS[i]` landed off the board.
pub(crate) const OFF_GRID_GATE: [u32; DIRECTION_COUNT] = derive_off_grid_gate();

/// Directions still worth probing after `DIRECTIONS[i]` was refused entry.
///
/// Passability and visit stamps say nothing about neighbouring cells, so an
/// entry rejection never rules out another probe.
pub(crate) const REJECTED_GATE: [u32; DIRECTION_COUNT] = [ALL_DIRECTIONS; DIRECTION_COUNT];

/// Bitmask of directions whose magnitude fits the provided speed.
pub(crate) fn speed_mask(max_speed: u32) -> u32 {
    DIRECTIONS
        .iter()
        .enumerate()
        .filter(|(_, direction)| direction.magnitude() <= max_speed)
        .fold(0, |mask, (index, _)| mask | (1 << index))
}

const fn ring_of(index: usize) -> usize {
    let mut ring = 0;
    while RING_BOUNDS[ring + 1] <= index {
        ring += 1;
    }
    ring
}

const fn derive_off_grid_gate() -> [u32; DIRECTION_COUNT] {
    let mut gate = [ALL_DIRECTIONS; DIRECTION_COUNT];
    let mut failed = 0;
    while failed < DIRECTION_COUNT {
        // Only later rings are gated; a ring never prunes its own members.
        let mut candidate = RING_BOUNDS[ring_of(failed) + 1];
        while candidate < DIRECTION_COUNT {
            if overshoots_with(DIRECTIONS[failed], DIRECTIONS[candidate]) {
                gate[failed] &= !(1 << candidate);
            }
            candidate += 1;
        }
        failed += 1;
    }
    gate
}

/// `true` when `failed` leaving the board forces `candidate` off the board too.
///
/// At least one non-zero axis of `failed` crossed an edge. If `candidate`
/// reaches at least as far along every such axis it crosses the same edge.
const fn overshoots_with(failed: Direction, candidate: Direction) -> bool {
    reaches(failed.dx(), candidate.dx()) && reaches(failed.dy(), candidate.dy())
}

const fn reaches(failed: i32, candidate: i32) -> bool {
    if failed > 0 {
        candidate >= failed
    } else if failed < 0 {
        candidate <= failed
    } else {
        true
    }
}
