//! Read-only view over the static board layers.

use crate::{BoardSize, GridError, Location};

/// Borrowed snapshot of the board data provider's dense layers.
///
/// Every layer is stored row-major and addressed through
/// [`BoardSize::index`]. The view never copies the layers; it only validates
/// that each one covers the whole board. Queries against cells that do not
/// belong to the board answer `false`.
#[derive(Clone, Copy, Debug)]
pub struct BoardView<'a> {
    size: BoardSize,
    passable: &'a [bool],
    primary: &'a [bool],
    secondary: &'a [bool],
}

impl<'a> BoardView<'a> {
    /// Captures a view over the passability layer and both resource layers.
    pub fn new(
        size: BoardSize,
        passable: &'a [bool],
        primary: &'a [bool],
        secondary: &'a [bool],
    ) -> Result<Self, GridError> {
        let expected = size.cell_count();
        for (layer, cells) in [
            ("passable", passable),
            ("primary resource", primary),
            ("secondary resource", secondary),
        ] {
            if cells.len() != expected {
                return Err(GridError::LayerLength {
                    layer,
                    expected,
                    actual: cells.len(),
                });
            }
        }

        Ok(Self {
            size,
            passable,
            primary,
            secondary,
        })
    }

    /// Board dimensions shared by every layer.
    #[must_use]
    pub const fn size(&self) -> BoardSize {
        self.size
    }

    /// Reports whether units may stand on the cell.
    #[must_use]
    pub fn is_passable(&self, location: Location) -> bool {
        self.sample(self.passable, location)
    }

    /// Reports whether the cell carries the primary resource.
    #[must_use]
    pub fn has_primary(&self, location: Location) -> bool {
        self.sample(self.primary, location)
    }

    /// Reports whether the cell carries the secondary resource.
    #[must_use]
    pub fn has_secondary(&self, location: Location) -> bool {
        self.sample(self.secondary, location)
    }

    /// Reports whether the cell carries either resource.
    #[must_use]
    pub fn has_resource(&self, location: Location) -> bool {
        self.has_primary(location) || self.has_secondary(location)
    }

    /// Iterates every cell of the board in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = Location> {
        self.size.locations()
    }

    fn sample(&self, layer: &[bool], location: Location) -> bool {
        self.size
            .index(location)
            .and_then(|index| layer.get(index).copied())
            .unwrap_or(false)
    }
}
