//! The tile grid.
//!
//! Tiles are kept in id order and addressed by their stable [`TileId`].
//! Positions are always derived from the id and the column count, so a
//! store rebuilt from a persisted document cannot disagree with a freshly
//! created one about where a tile sits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sprout_types::{Tile, TileId};

use crate::error::FarmError;

/// Ordered collection of farm tiles keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStore {
    /// Grid width used to derive tile positions.
    columns: u32,
    /// Every tile on the grid.
    tiles: BTreeMap<TileId, Tile>,
}

impl TileStore {
    /// Create a grid of `rows * columns` empty tiles with ids `0..rows*columns`.
    pub fn new(rows: u32, columns: u32) -> Self {
        let count = rows.saturating_mul(columns);
        let tiles = (0..count)
            .map(|id| (TileId(id), Tile::empty(TileId(id), columns)))
            .collect();
        Self { columns, tiles }
    }

    /// Rebuild a store from decoded tiles.
    ///
    /// Positions are re-derived from ids. If two tiles share an id the later
    /// one wins.
    pub fn from_tiles(columns: u32, tiles: impl IntoIterator<Item = Tile>) -> Self {
        let tiles = tiles
            .into_iter()
            .map(|mut tile| {
                let (row, col) = tile.id.position(columns);
                tile.row = row;
                tile.col = col;
                (tile.id, tile)
            })
            .collect();
        Self { columns, tiles }
    }

    /// Grid width.
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Look up a tile.
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// Look up a tile for mutation.
    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    /// Look up a tile, failing with [`FarmError::TileNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::TileNotFound`] if no tile has this id.
    pub fn require_mut(&mut self, id: TileId) -> Result<&mut Tile, FarmError> {
        self.tiles.get_mut(&id).ok_or(FarmError::TileNotFound(id))
    }

    /// All tiles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// All tiles in id order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.values_mut()
    }

    /// Take the tiles out in id order, consuming the store.
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles.into_values().collect()
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the grid has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tiles with a crop in the ground.
    pub fn planted_count(&self) -> usize {
        self.tiles.values().filter(|tile| !tile.is_empty()).count()
    }
}
