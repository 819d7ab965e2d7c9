//! ASCII board format consumed by the command-line adapter.
//!
//! One text line per board row, top row first. `.` is open ground, `#` is
//! impassable, `a` and `b` carry the primary and secondary resource and `c`
//! carries both. Resource cells are passable. Blank lines are ignored.

use gridwise_core::{BoardSize, BoardView, GridError};
use thiserror::Error;

/// Dense layers decoded from an ASCII board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BoardLayers {
    size: BoardSize,
    passable: Vec<bool>,
    primary: Vec<bool>,
    secondary: Vec<bool>,
}

impl BoardLayers {
    /// Decodes a square board from its ASCII representation.
    pub(crate) fn parse(text: &str) -> Result<Self, MapFileError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(MapFileError::Empty);
        };

        let columns = first.chars().count();
        if rows.len() != columns {
            return Err(MapFileError::NotSquare {
                rows: rows.len(),
                columns,
            });
        }

        let side = u32::try_from(columns).unwrap_or(u32::MAX);
        let size = BoardSize::new(side)?;
        let cells = size.cell_count();
        let mut layers = Self {
            size,
            passable: Vec::with_capacity(cells),
            primary: Vec::with_capacity(cells),
            secondary: Vec::with_capacity(cells),
        };

        for (row, line) in rows.iter().enumerate() {
            let width = line.chars().count();
            if width != columns {
                return Err(MapFileError::Ragged {
                    row,
                    expected: columns,
                    actual: width,
                });
            }

            for (column, glyph) in line.chars().enumerate() {
                let (passable, primary, secondary) = match glyph {
                    '.' => (true, false, false),
                    '#' => (false, false, false),
                    'a' => (true, true, false),
                    'b' => (true, false, true),
                    'c' => (true, true, true),
                    other => {
                        return Err(MapFileError::UnknownGlyph {
                            glyph: other,
                            row,
                            column,
                        })
                    }
                };
                layers.passable.push(passable);
                layers.primary.push(primary);
                layers.secondary.push(secondary);
            }
        }

        Ok(layers)
    }

    /// Board dimensions of the decoded map.
    #[must_use]
    pub(crate) const fn size(&self) -> BoardSize {
        self.size
    }

    /// Borrowed view handed to the core systems.
    pub(crate) fn view(&self) -> Result<BoardView<'_>, GridError> {
        BoardView::new(self.size, &self.passable, &self.primary, &self.secondary)
    }
}

/// Errors that can occur while decoding an ASCII board.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum MapFileError {
    /// The file held no board rows.
    #[error("map contains no rows")]
    Empty,
    /// The row count differs from the column count.
    #[error("map has {rows} rows but {columns} columns; boards must be square")]
    NotSquare {
        /// Number of non-empty rows.
        rows: usize,
        /// Number of cells in the first row.
        columns: usize,
    },
    /// A row's width differs from the first row.
    #[error("row {row} has {actual} cells, expected {expected}")]
    Ragged {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// A glyph outside the map alphabet was found.
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },
    /// The board cannot be addressed by the packed codec.
    #[error(transparent)]
    Grid(#[from] GridError),
}
