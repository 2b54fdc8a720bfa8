//! The persisted farm document.
//!
//! One [`GameDocument`] exists per user. Every save overwrites the whole
//! document, so it always carries the complete tile array, inventory and
//! gold balance.
//!
//! # Wire Shape
//!
//! ```text
//! {
//!   "tiles": [
//!     { "id": 0, "row": 0, "col": 0, "type": "crop", "cropName": "carrot",
//!       "isReady": false, "remainingTime": 7, "growTime": 10 },
//!     { "id": 1, "row": 0, "col": 1, "type": "empty", "cropName": null,
//!       "isReady": false, "remainingTime": null, "growTime": null }
//!   ],
//!   "inventory": { "carrot": 3 },
//!   "gold": 100,
//!   "lastUpdated": 1700000000000,
//!   "version": 1
//! }
//! ```
//!
//! Empty tiles write their crop fields as explicit `null`. Decoding is
//! lenient: unknown fields are ignored, missing fields take defaults, and
//! out-of-range timers are clamped instead of rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::TileId;
use crate::structs::{GrowingCrop, Tile, TileState};

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Gold balance of a brand-new farm.
pub const STARTING_GOLD: u64 = 100;

const fn default_gold() -> u64 {
    STARTING_GOLD
}

const fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// Discriminant of a tile record on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum TileKind {
    /// Nothing planted.
    #[default]
    Empty,
    /// A growing crop.
    Crop,
}

/// Wire form of a single tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct TileRecord {
    /// Stable tile id.
    pub id: u32,
    /// Grid row. Informational; recomputed from `id` on decode.
    pub row: u32,
    /// Grid column. Informational; recomputed from `id` on decode.
    pub col: u32,
    /// Empty or crop.
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Crop catalog name, `null` for empty tiles.
    pub crop_name: Option<String>,
    /// Whether the current cycle has completed.
    pub is_ready: bool,
    /// Seconds left in the current cycle, `null` for empty tiles.
    pub remaining_time: Option<i64>,
    /// Length of one cycle in seconds, `null` for empty tiles.
    pub grow_time: Option<i64>,
}

impl From<&Tile> for TileRecord {
    fn from(tile: &Tile) -> Self {
        match &tile.state {
            TileState::Empty => Self {
                id: tile.id.into_inner(),
                row: tile.row,
                col: tile.col,
                kind: TileKind::Empty,
                crop_name: None,
                is_ready: false,
                remaining_time: None,
                grow_time: None,
            },
            TileState::Growing(crop) => Self {
                id: tile.id.into_inner(),
                row: tile.row,
                col: tile.col,
                kind: TileKind::Crop,
                crop_name: Some(crop.crop.clone()),
                is_ready: crop.ready,
                remaining_time: Some(i64::from(crop.remaining_secs)),
                grow_time: Some(i64::from(crop.grow_duration_secs)),
            },
        }
    }
}

impl TileRecord {
    /// Decode into a domain tile on a grid with `columns` columns.
    ///
    /// Corrupt timer values are clamped: a negative remaining time becomes
    /// zero and a remaining time above the cycle length becomes the cycle
    /// length. A crop record without a crop name decodes as empty. A missing
    /// or non-positive grow time yields an inert crop that never advances.
    pub fn into_tile(self, columns: u32) -> Tile {
        let mut tile = Tile::empty(TileId(self.id), columns);

        let crop_name = match (self.kind, self.crop_name) {
            (TileKind::Crop, Some(name)) if !name.is_empty() => name,
            _ => return tile,
        };

        let grow_duration_secs = clamp_secs(self.grow_time.unwrap_or(0), u32::MAX);
        let remaining_secs = clamp_secs(self.remaining_time.unwrap_or(0), grow_duration_secs);

        tile.state = TileState::Growing(GrowingCrop {
            crop: crop_name,
            grow_duration_secs,
            remaining_secs,
            ready: remaining_secs == 0,
        });
        tile
    }
}

/// Clamp a wire-level second count into `0..=max`.
fn clamp_secs(value: i64, max: u32) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX).min(max)
}

/// The complete persisted state of one user's farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameDocument {
    /// Every tile of the grid, in id order.
    #[serde(default)]
    pub tiles: Vec<TileRecord>,
    /// Crop name to held quantity. Zero quantities are never stored.
    #[serde(default)]
    pub inventory: BTreeMap<String, u64>,
    /// Wallet balance.
    #[serde(default = "default_gold")]
    pub gold: u64,
    /// Epoch milliseconds of the write. Missing means "no offline credit".
    #[serde(default)]
    pub last_updated: Option<i64>,
    /// Document format version, reserved for migrations.
    #[serde(default = "default_version")]
    pub version: u32,
}

impl GameDocument {
    /// Assemble a document from domain tiles and balances, stamped `now_ms`.
    pub fn from_parts<'a>(
        tiles: impl IntoIterator<Item = &'a Tile>,
        inventory: &BTreeMap<String, u64>,
        gold: u64,
        now_ms: i64,
    ) -> Self {
        Self {
            tiles: tiles.into_iter().map(TileRecord::from).collect(),
            inventory: inventory
                .iter()
                .filter(|(_, qty)| **qty > 0)
                .map(|(name, qty)| (name.clone(), *qty))
                .collect(),
            gold,
            last_updated: Some(now_ms),
            version: DOCUMENT_VERSION,
        }
    }

    /// Decode every tile record for a grid with `columns` columns.
    pub fn decode_tiles(&self, columns: u32) -> Vec<Tile> {
        self.tiles
            .iter()
            .cloned()
            .map(|record| record.into_tile(columns))
            .collect()
    }

    /// Number of tiles with a crop in the ground.
    pub fn planted_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|record| record.kind == TileKind::Crop)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn growing_tile(id: u32, remaining: u32, duration: u32) -> Tile {
        let mut tile = Tile::empty(TileId(id), 15);
        tile.state = TileState::Growing(GrowingCrop {
            crop: String::from("carrot"),
            grow_duration_secs: duration,
            remaining_secs: remaining,
            ready: remaining == 0,
        });
        tile
    }

    #[test]
    fn empty_tile_writes_explicit_nulls() {
        let tile = Tile::empty(TileId(1), 15);
        let json = serde_json::to_value(TileRecord::from(&tile)).unwrap();

        assert_eq!(json["type"], "empty");
        assert!(json["cropName"].is_null());
        assert!(json["remainingTime"].is_null());
        assert!(json["growTime"].is_null());
        assert_eq!(json["isReady"], false);
    }

    #[test]
    fn growing_tile_survives_the_wire() {
        let tile = growing_tile(20, 7, 10);
        let json = serde_json::to_string(&TileRecord::from(&tile)).unwrap();
        let record: TileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.into_tile(15), tile);
    }

    #[test]
    fn negative_remaining_time_is_clamped_to_zero() {
        let record = TileRecord {
            id: 0,
            kind: TileKind::Crop,
            crop_name: Some(String::from("corn")),
            remaining_time: Some(-4),
            grow_time: Some(15),
            ..TileRecord::default()
        };
        let tile = record.into_tile(15);
        let crop = tile.crop().unwrap();
        assert_eq!(crop.remaining_secs, 0);
        assert!(crop.ready);
    }

    #[test]
    fn remaining_time_above_cycle_is_clamped() {
        let record = TileRecord {
            id: 0,
            kind: TileKind::Crop,
            crop_name: Some(String::from("corn")),
            remaining_time: Some(99),
            grow_time: Some(15),
            ..TileRecord::default()
        };
        assert_eq!(record.into_tile(15).crop().unwrap().remaining_secs, 15);
    }

    #[test]
    fn crop_record_without_name_decodes_empty() {
        let record = TileRecord {
            id: 4,
            kind: TileKind::Crop,
            crop_name: None,
            remaining_time: Some(3),
            grow_time: Some(10),
            ..TileRecord::default()
        };
        assert!(record.into_tile(15).is_empty());
    }

    #[test]
    fn missing_grow_time_yields_inert_crop() {
        let record = TileRecord {
            id: 4,
            kind: TileKind::Crop,
            crop_name: Some(String::from("apple")),
            remaining_time: Some(3),
            grow_time: None,
            ..TileRecord::default()
        };
        let tile = record.into_tile(15);
        let crop = tile.crop().unwrap();
        assert!(!crop.is_eligible());
        assert_eq!(crop.remaining_secs, 0);
    }

    #[test]
    fn position_is_recomputed_from_id() {
        let record = TileRecord {
            id: 31,
            row: 99,
            col: 99,
            ..TileRecord::default()
        };
        let tile = record.into_tile(15);
        assert_eq!((tile.row, tile.col), (2, 1));
    }

    #[test]
    fn legacy_document_with_zeroed_empty_tiles_decodes() {
        let json = r#"{
            "tiles": [
                { "id": 0, "row": 0, "col": 0, "type": "empty", "isReady": false,
                  "remainingTime": 0, "growTime": 0 },
                { "id": 1, "row": 0, "col": 1, "type": "crop", "cropName": "carrot",
                  "isReady": false, "remainingTime": 4, "growTime": 10 }
            ],
            "inventory": { "carrot": 2 },
            "gold": 340,
            "lastUpdated": 1700000000000,
            "version": 1,
            "someFutureField": true
        }"#;
        let doc: GameDocument = serde_json::from_str(json).unwrap();
        let tiles = doc.decode_tiles(15);

        assert_eq!(doc.gold, 340);
        assert_eq!(doc.last_updated, Some(1_700_000_000_000));
        assert_eq!(doc.planted_count(), 1);
        assert!(tiles[0].is_empty());
        assert_eq!(tiles[1].crop().unwrap().remaining_secs, 4);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let doc: GameDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.tiles.is_empty());
        assert!(doc.inventory.is_empty());
        assert_eq!(doc.gold, STARTING_GOLD);
        assert_eq!(doc.last_updated, None);
        assert_eq!(doc.version, DOCUMENT_VERSION);
    }

    #[test]
    fn from_parts_drops_zero_quantities_and_stamps_time() {
        let tiles = vec![Tile::empty(TileId(0), 15), growing_tile(1, 5, 10)];
        let mut inventory = BTreeMap::new();
        inventory.insert(String::from("carrot"), 3);
        inventory.insert(String::from("corn"), 0);

        let doc = GameDocument::from_parts(&tiles, &inventory, 250, 42);

        assert_eq!(doc.tiles.len(), 2);
        assert_eq!(doc.inventory.len(), 1);
        assert_eq!(doc.gold, 250);
        assert_eq!(doc.last_updated, Some(42));
        assert_eq!(doc.version, DOCUMENT_VERSION);
    }
}
