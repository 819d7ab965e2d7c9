#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the gridwise spatial-reasoning engine.
//!
//! This crate defines the packed coordinate algebra every other crate speaks.
//! A [`Location`] names a board cell and a [`Direction`] names a displacement;
//! both are a single 16-bit word holding two signed byte fields, so they can be
//! copied, hashed, queued and compared without touching the heap. The
//! [`BoardSize`] owns every bounds-aware operation: packing, offsetting,
//! dense indexing and the compressed side-channel form. Systems borrow the
//! static board layers through a [`BoardView`] and use a [`BoundedQueue`]
//! wherever they need a breadth-first frontier.

mod board;
mod frontier;

use std::{fmt, ops::Neg};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use board::BoardView;
pub use frontier::BoundedQueue;

/// Largest board side the packed codec can represent.
///
/// Fields are signed bytes and the sentinel claims `i8::MIN`, so every on-board
/// coordinate must stay within `0..=126`.
pub const MAX_BOARD_SIDE: u32 = 127;

const OFF_GRID_FIELD: i8 = i8::MIN;

const fn pack_fields(x: i8, y: i8) -> u16 {
    (x as u8 as u16) | ((y as u8 as u16) << 8)
}

const fn low_field(word: u16) -> i8 {
    (word & 0x00FF) as u8 as i8
}

const fn high_field(word: u16) -> i8 {
    (word >> 8) as u8 as i8
}

/// Board cell packed into a single word.
///
/// The column lives in the low byte and the row in the high byte. Values are
/// produced by [`BoardSize::pack`] and [`BoardSize::add`]; neither ever yields a
/// coordinate outside the board other than [`Location::OFF_GRID`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(u16);

impl Location {
    /// Sentinel returned whenever arithmetic leaves the board.
    pub const OFF_GRID: Location = Location(pack_fields(OFF_GRID_FIELD, OFF_GRID_FIELD));

    /// Rebuilds a location from its packed word.
    #[must_use]
    pub const fn from_packed(word: u16) -> Self {
        Self(word)
    }

    /// Packed word backing the location.
    #[must_use]
    pub const fn packed(self) -> u16 {
        self.0
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(self) -> i32 {
        low_field(self.0) as i32
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(self) -> i32 {
        high_field(self.0) as i32
    }

    /// Reports whether the value is the off-grid sentinel.
    #[must_use]
    pub const fn is_off_grid(self) -> bool {
        self.0 == Self::OFF_GRID.0
    }

    /// Displacement that carries `self` onto `other`.
    ///
    /// Both operands must be on-board cells; their coordinate difference then
    /// always fits the packed field width.
    #[must_use]
    pub fn displacement_to(self, other: Location) -> Direction {
        debug_assert!(
            !self.is_off_grid() && !other.is_off_grid(),
            "displacement requested for the off-grid sentinel"
        );
        Direction::new(
            (other.x() - self.x()) as i8,
            (other.y() - self.y()) as i8,
        )
    }

    /// Squared euclidean distance between two on-board cells.
    #[must_use]
    pub fn distance_squared(self, other: Location) -> u32 {
        self.displacement_to(other).magnitude()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_off_grid() {
            write!(f, "Location(OFF_GRID)")
        } else {
            write!(f, "Location({}, {})", self.x(), self.y())
        }
    }
}

/// Displacement vector sharing the [`Location`] bit layout.
///
/// Movement budgets are expressed as a maximum [`Direction::magnitude`], the
/// squared euclidean length, rather than a Chebyshev or Manhattan radius.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Direction(u16);

impl Direction {
    /// Displacement that stays in place.
    pub const ZERO: Direction = Direction::new(0, 0);

    /// Creates a displacement from its column and row deltas.
    #[must_use]
    pub const fn new(dx: i8, dy: i8) -> Self {
        Self(pack_fields(dx, dy))
    }

    /// Rebuilds a direction from its packed word.
    #[must_use]
    pub const fn from_packed(word: u16) -> Self {
        Self(word)
    }

    /// Packed word backing the direction.
    #[must_use]
    pub const fn packed(self) -> u16 {
        self.0
    }

    /// Column delta.
    #[must_use]
    pub const fn dx(self) -> i32 {
        low_field(self.0) as i32
    }

    /// Row delta.
    #[must_use]
    pub const fn dy(self) -> i32 {
        high_field(self.0) as i32
    }

    /// Squared euclidean length `dx² + dy²`.
    #[must_use]
    pub const fn magnitude(self) -> u32 {
        let dx = self.dx();
        let dy = self.dy();
        (dx * dx + dy * dy) as u32
    }

    /// Reports whether the displacement is zero on both axes.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == Self::ZERO.0
    }

    /// Componentwise sum, or `None` when either field overflows.
    #[must_use]
    pub fn checked_add(self, other: Direction) -> Option<Direction> {
        let dx = i8::try_from(self.dx() + other.dx()).ok()?;
        let dy = i8::try_from(self.dy() + other.dy()).ok()?;
        Some(Self::new(dx, dy))
    }
}

impl Neg for Direction {
    type Output = Direction;

    fn neg(self) -> Self::Output {
        Self::new(
            low_field(self.0).wrapping_neg(),
            high_field(self.0).wrapping_neg(),
        )
    }
}

impl fmt::Debug for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Direction({}, {})", self.dx(), self.dy())
    }
}

/// Side length of the square board, fixed for a whole match.
///
/// Serialises as the bare side length; deserialising runs the same checks as
/// [`BoardSize::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BoardSize {
    side: u32,
}

impl BoardSize {
    /// Validates the side length against the packed codec limits.
    pub fn new(side: u32) -> Result<Self, GridError> {
        if side == 0 {
            return Err(GridError::EmptyBoard);
        }
        if side > MAX_BOARD_SIDE {
            return Err(GridError::BoardTooLarge { side });
        }
        Ok(Self { side })
    }

    /// Number of cells along each edge.
    #[must_use]
    pub const fn side(self) -> u32 {
        self.side
    }

    /// Total number of cells on the board.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        (self.side * self.side) as usize
    }

    /// Reports whether the coordinate pair lies on the board.
    #[must_use]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        let side = self.side as i32;
        x >= 0 && y >= 0 && x < side && y < side
    }

    /// Packs an on-board coordinate pair.
    ///
    /// Coordinates are validated upstream; passing an off-board pair trips a
    /// debug assertion and yields [`Location::OFF_GRID`] in release builds.
    #[must_use]
    pub fn pack(self, x: i32, y: i32) -> Location {
        if self.contains(x, y) {
            return Location(pack_fields(x as i8, y as i8));
        }

        debug_assert!(false, "pack({x}, {y}) outside a board of side {}", self.side);
        warn!(x, y, side = self.side, "pack received off-board coordinates");
        Location::OFF_GRID
    }

    /// Offsets a location, returning [`Location::OFF_GRID`] when the sum leaves the board.
    ///
    /// Offsetting the sentinel itself is a caller error.
    #[must_use]
    pub fn add(self, location: Location, direction: Direction) -> Location {
        if location.is_off_grid() {
            debug_assert!(false, "add applied to the off-grid sentinel");
            return Location::OFF_GRID;
        }

        let x = location.x() + direction.dx();
        let y = location.y() + direction.dy();
        if self.contains(x, y) {
            Location(pack_fields(x as i8, y as i8))
        } else {
            Location::OFF_GRID
        }
    }

    /// [`BoardSize::add`] expressed as an option.
    #[must_use]
    pub fn checked_add(self, location: Location, direction: Direction) -> Option<Location> {
        let next = self.add(location, direction);
        (!next.is_off_grid()).then_some(next)
    }

    /// Reports whether the location is a cell of this board.
    #[must_use]
    pub const fn holds(self, location: Location) -> bool {
        !location.is_off_grid() && self.contains(location.x(), location.y())
    }

    /// Row-major offset of the location in dense per-cell arrays.
    #[must_use]
    pub fn index(self, location: Location) -> Option<usize> {
        if !self.holds(location) {
            return None;
        }

        let row = usize::try_from(location.y()).ok()?;
        let column = usize::try_from(location.x()).ok()?;
        let width = usize::try_from(self.side).ok()?;
        Some(row * width + column)
    }

    /// Location stored at the provided row-major offset.
    #[must_use]
    pub fn location_at(self, index: usize) -> Option<Location> {
        if index >= self.cell_count() {
            return None;
        }

        let width = usize::try_from(self.side).ok()?;
        let x = i32::try_from(index % width).ok()?;
        let y = i32::try_from(index / width).ok()?;
        Some(self.pack(x, y))
    }

    /// Iterates every cell in row-major order.
    pub fn locations(self) -> impl Iterator<Item = Location> {
        let side = self.side as i32;
        (0..side).flat_map(move |y| (0..side).map(move |x| Location(pack_fields(x as i8, y as i8))))
    }

    /// Number of bits a compressed location occupies on this board.
    #[must_use]
    pub const fn compressed_bits(self) -> u32 {
        let cells = self.side * self.side;
        let bits = u32::BITS - (cells - 1).leading_zeros();
        if bits == 0 {
            1
        } else {
            bits
        }
    }

    /// Narrow form of a location for low-bandwidth side channels.
    ///
    /// The code is the dense row-major index, so it never exceeds
    /// [`BoardSize::compressed_bits`] bits.
    #[must_use]
    pub fn compress(self, location: Location) -> Option<u16> {
        self.index(location)
            .and_then(|index| u16::try_from(index).ok())
    }

    /// Inverse of [`BoardSize::compress`].
    #[must_use]
    pub fn decompress(self, code: u16) -> Option<Location> {
        self.location_at(usize::from(code))
    }
}

impl TryFrom<u32> for BoardSize {
    type Error = GridError;

    fn try_from(side: u32) -> Result<Self, Self::Error> {
        Self::new(side)
    }
}

impl From<BoardSize> for u32 {
    fn from(size: BoardSize) -> Self {
        size.side
    }
}

/// Errors raised while describing a board to the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The board side was zero.
    #[error("board side must be at least one cell")]
    EmptyBoard,
    /// The board side exceeds what the packed codec can address.
    #[error("board side {side} exceeds the packed codec limit of {}", MAX_BOARD_SIDE)]
    BoardTooLarge {
        /// Side length that was requested.
        side: u32,
    },
    /// A dense layer did not match the board's cell count.
    #[error("{layer} layer holds {actual} cells but the board has {expected}")]
    LayerLength {
        /// Name of the offending layer.
        layer: &'static str,
        /// Cell count implied by the board size.
        expected: usize,
        /// Cell count supplied by the caller.
        actual: usize,
    },
}
