//! Crop catalog entries and tile state.
//!
//! A tile is either [`TileState::Empty`] or [`TileState::Growing`]. Crop
//! fields only exist on the growing variant, so clearing a tile cannot
//! leave stale crop data behind.

use serde::{Deserialize, Serialize};

use crate::ids::TileId;

// ---------------------------------------------------------------------------
// CropInfo
// ---------------------------------------------------------------------------

/// One entry of the crop catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropInfo {
    /// Unique catalog key.
    pub name: String,
    /// Display icon.
    pub icon: String,
    /// Gold paid per unit sold.
    pub sell_price: u64,
    /// Seconds from planting to harvest. Always greater than zero.
    pub grow_duration_secs: u32,
}

// ---------------------------------------------------------------------------
// GrowingCrop
// ---------------------------------------------------------------------------

/// Crop fields of a growing tile.
///
/// `grow_duration_secs` is copied from the catalog at planting time so later
/// catalog edits never change a crop already in the ground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowingCrop {
    /// Catalog name of the crop.
    pub crop: String,
    /// Length of one growth cycle in seconds.
    pub grow_duration_secs: u32,
    /// Seconds left in the current cycle, in `0..=grow_duration_secs`.
    pub remaining_secs: u32,
    /// True exactly when `remaining_secs` is zero.
    pub ready: bool,
}

impl GrowingCrop {
    /// A freshly planted crop at the start of its first cycle.
    pub fn planted(crop: impl Into<String>, grow_duration_secs: u32) -> Self {
        Self {
            crop: crop.into(),
            grow_duration_secs,
            remaining_secs: grow_duration_secs,
            ready: false,
        }
    }

    /// Whether the crop can advance at all. Zero-length cycles are inert.
    pub const fn is_eligible(&self) -> bool {
        self.grow_duration_secs > 0
    }

    /// Restart the cycle with the same crop.
    pub const fn replant(&mut self) {
        self.remaining_secs = self.grow_duration_secs;
        self.ready = false;
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// Kind-specific state of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileState {
    /// Nothing planted.
    Empty,
    /// A crop in an endless grow-harvest-replant loop.
    Growing(GrowingCrop),
}

/// One plot on the farm grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Stable identity.
    pub id: TileId,
    /// Grid row, derived from `id`.
    pub row: u32,
    /// Grid column, derived from `id`.
    pub col: u32,
    /// Empty or growing.
    pub state: TileState,
}

impl Tile {
    /// An empty tile positioned on a grid with `columns` columns.
    pub const fn empty(id: TileId, columns: u32) -> Self {
        let (row, col) = id.position(columns);
        Self {
            id,
            row,
            col,
            state: TileState::Empty,
        }
    }

    /// Whether nothing is planted here.
    pub const fn is_empty(&self) -> bool {
        matches!(self.state, TileState::Empty)
    }

    /// The growing crop, if any.
    pub const fn crop(&self) -> Option<&GrowingCrop> {
        match &self.state {
            TileState::Growing(crop) => Some(crop),
            TileState::Empty => None,
        }
    }

    /// Mutable access to the growing crop, if any.
    pub const fn crop_mut(&mut self) -> Option<&mut GrowingCrop> {
        match &mut self.state {
            TileState::Growing(crop) => Some(crop),
            TileState::Empty => None,
        }
    }

    /// Reset to empty, dropping every crop field.
    pub fn clear(&mut self) {
        self.state = TileState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planted_crop_starts_full_cycle() {
        let crop = GrowingCrop::planted("carrot", 10);
        assert_eq!(crop.remaining_secs, 10);
        assert_eq!(crop.grow_duration_secs, 10);
        assert!(!crop.ready);
        assert!(crop.is_eligible());
    }

    #[test]
    fn zero_duration_crop_is_not_eligible() {
        assert!(!GrowingCrop::planted("carrot", 0).is_eligible());
    }

    #[test]
    fn clear_drops_crop_fields() {
        let mut tile = Tile::empty(TileId(3), 15);
        tile.state = TileState::Growing(GrowingCrop::planted("corn", 15));
        assert!(tile.crop().is_some());

        tile.clear();
        assert!(tile.is_empty());
        assert_eq!(tile.state, TileState::Empty);
        assert!(tile.crop().is_none());
    }

    #[test]
    fn empty_tile_derives_position() {
        let tile = Tile::empty(TileId(16), 15);
        assert_eq!((tile.row, tile.col), (1, 1));
    }
}
