//! Per-second crop growth and the player actions on tiles.
//!
//! Every planted tile runs an endless grow, harvest, replant loop. One call
//! to [`tick`] advances every eligible tile by exactly one second. A tile
//! that finishes its cycle yields one unit of its crop and immediately
//! restarts with the same crop; it never goes back to empty on its own.
//!
//! [`offline::reconcile`](crate::offline::reconcile) must agree exactly with
//! calling [`tick`] once per elapsed second. Any change to the rules here has
//! to be mirrored there.

use serde::{Deserialize, Serialize};
use sprout_types::{GrowingCrop, TileId, TileState};

use crate::catalog::CropCatalog;
use crate::error::FarmError;
use crate::inventory::Inventory;
use crate::tiles::TileStore;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// One completed growth cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestEvent {
    /// Tile the crop grew on.
    pub tile: TileId,
    /// Catalog name of the harvested crop.
    pub crop: String,
    /// Units credited. Always 1 per completed cycle.
    pub count: u32,
}

/// What a single [`tick`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Harvests in tile-id order, one per completed cycle.
    pub harvests: Vec<HarvestEvent>,
}

impl TickReport {
    /// Whether nothing was harvested.
    pub fn is_empty(&self) -> bool {
        self.harvests.is_empty()
    }

    /// Total units harvested this tick.
    pub fn total(&self) -> u64 {
        self.harvests
            .iter()
            .fold(0_u64, |acc, event| acc.saturating_add(u64::from(event.count)))
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// Advance every growing tile by one second.
///
/// Tiles with a zero-length cycle are inert and skipped. A tile already at
/// zero remaining (only possible from loaded data) is marked ready and not
/// decremented. A tile that reaches zero is credited one unit and replanted.
pub fn tick(tiles: &mut TileStore, inventory: &mut Inventory) -> TickReport {
    let mut report = TickReport::default();

    for tile in tiles.iter_mut() {
        let tile_id = tile.id;
        let Some(crop) = tile.crop_mut() else {
            continue;
        };
        if !crop.is_eligible() {
            continue;
        }

        let Some(remaining) = crop.remaining_secs.checked_sub(1) else {
            crop.ready = true;
            continue;
        };
        crop.remaining_secs = remaining;
        if remaining > 0 {
            continue;
        }

        if let Err(e) = inventory.add(&crop.crop, 1) {
            tracing::warn!(tile = %tile_id, crop = %crop.crop, error = %e, "harvest credit failed");
        } else {
            report.harvests.push(HarvestEvent {
                tile: tile_id,
                crop: crop.crop.clone(),
                count: 1,
            });
        }
        crop.replant();
    }

    if !report.is_empty() {
        tracing::debug!(harvested = report.harvests.len(), "tick completed growth cycles");
    }
    report
}

// ---------------------------------------------------------------------------
// Player actions
// ---------------------------------------------------------------------------

/// Plant `crop` on an empty tile.
///
/// # Errors
///
/// Returns [`FarmError::UnknownCrop`] if the crop is not in the catalog,
/// [`FarmError::TileNotFound`] for an unknown tile, and
/// [`FarmError::TileOccupied`] if something is already growing there. The
/// tile is unchanged on error.
pub fn plant(
    tiles: &mut TileStore,
    catalog: &CropCatalog,
    tile_id: TileId,
    crop: &str,
) -> Result<(), FarmError> {
    let info = catalog.require(crop)?;
    let tile = tiles.require_mut(tile_id)?;
    if !tile.is_empty() {
        return Err(FarmError::TileOccupied(tile_id));
    }

    tile.state = TileState::Growing(GrowingCrop::planted(
        info.name.clone(),
        info.grow_duration_secs,
    ));
    tracing::debug!(tile = %tile_id, crop, secs = info.grow_duration_secs, "planted");
    Ok(())
}

/// Harvest a growing tile early, at any remaining time.
///
/// Credits one unit and restarts the cycle with the same crop.
///
/// # Errors
///
/// Returns [`FarmError::TileNotFound`] for an unknown tile,
/// [`FarmError::TileEmpty`] if nothing is planted, and
/// [`FarmError::ArithmeticOverflow`] if the inventory count would overflow.
/// Nothing changes on error.
pub fn manual_harvest(
    tiles: &mut TileStore,
    inventory: &mut Inventory,
    tile_id: TileId,
) -> Result<HarvestEvent, FarmError> {
    let tile = tiles.require_mut(tile_id)?;
    let crop = tile.crop_mut().ok_or(FarmError::TileEmpty(tile_id))?;

    inventory.add(&crop.crop, 1)?;
    crop.replant();

    tracing::debug!(tile = %tile_id, crop = %crop.crop, "manual harvest");
    Ok(HarvestEvent {
        tile: tile_id,
        crop: crop.crop.clone(),
        count: 1,
    })
}

/// Clear a tile back to empty, discarding any growth in progress.
///
/// Works on growing and empty tiles alike and never yields anything.
/// Returns the crop that was removed, if there was one.
///
/// # Errors
///
/// Returns [`FarmError::TileNotFound`] for an unknown tile.
pub fn remove_tile(tiles: &mut TileStore, tile_id: TileId) -> Result<Option<GrowingCrop>, FarmError> {
    let tile = tiles.require_mut(tile_id)?;
    let previous = tile.crop().cloned();
    tile.clear();
    if let Some(crop) = &previous {
        tracing::debug!(tile = %tile_id, crop = %crop.crop, "tile cleared");
    }
    Ok(previous)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid_with(remaining: u32, duration: u32) -> TileStore {
        let mut store = TileStore::new(1, 3);
        store.get_mut(TileId(0)).unwrap().state = TileState::Growing(GrowingCrop {
            crop: String::from("carrot"),
            grow_duration_secs: duration,
            remaining_secs: remaining,
            ready: remaining == 0,
        });
        store
    }

    fn crop_at(store: &TileStore, id: u32) -> GrowingCrop {
        store.get(TileId(id)).unwrap().crop().unwrap().clone()
    }

    #[test]
    fn tick_decrements_by_one() {
        let mut store = grid_with(5, 10);
        let mut inv = Inventory::new();
        let report = tick(&mut store, &mut inv);
        assert!(report.is_empty());
        assert_eq!(crop_at(&store, 0).remaining_secs, 4);
        assert!(inv.is_empty());
    }

    #[test]
    fn completing_cycle_credits_and_replants() {
        let mut store = grid_with(1, 10);
        let mut inv = Inventory::new();
        let report = tick(&mut store, &mut inv);

        assert_eq!(report.total(), 1);
        assert_eq!(report.harvests.first().unwrap().crop, "carrot");
        assert_eq!(inv.quantity("carrot"), 1);
        let crop = crop_at(&store, 0);
        assert_eq!(crop.remaining_secs, 10);
        assert!(!crop.ready);
    }

    #[test]
    fn crop_regrows_indefinitely() {
        let mut store = grid_with(10, 10);
        let mut inv = Inventory::new();
        for _ in 0..35 {
            tick(&mut store, &mut inv);
        }
        assert_eq!(inv.quantity("carrot"), 3);
        assert_eq!(crop_at(&store, 0).remaining_secs, 5);
    }

    #[test]
    fn every_finishing_tile_reports_separately() {
        let mut store = TileStore::new(1, 3);
        for id in 0..3 {
            store.get_mut(TileId(id)).unwrap().state =
                TileState::Growing(GrowingCrop::planted("corn", 1));
        }
        let mut inv = Inventory::new();
        let report = tick(&mut store, &mut inv);
        assert_eq!(report.harvests.len(), 3);
        assert!(report.harvests.iter().all(|event| event.crop == "corn"));
        assert_eq!(inv.quantity("corn"), 3);
    }

    #[test]
    fn zero_remaining_is_marked_ready_not_decremented() {
        let mut store = grid_with(0, 10);
        store.get_mut(TileId(0)).unwrap().crop_mut().unwrap().ready = false;
        let mut inv = Inventory::new();
        let report = tick(&mut store, &mut inv);
        assert!(report.is_empty());
        let crop = crop_at(&store, 0);
        assert_eq!(crop.remaining_secs, 0);
        assert!(crop.ready);
    }

    #[test]
    fn zero_duration_tile_is_inert() {
        let mut store = grid_with(0, 0);
        let before = store.clone();
        let mut inv = Inventory::new();
        tick(&mut store, &mut inv);
        assert_eq!(store, before);
    }

    #[test]
    fn plant_copies_catalog_duration() {
        let mut store = TileStore::new(1, 3);
        plant(&mut store, &CropCatalog::default(), TileId(2), "tomato").unwrap();
        let crop = crop_at(&store, 2);
        assert_eq!(crop.grow_duration_secs, 20);
        assert_eq!(crop.remaining_secs, 20);
    }

    #[test]
    fn plant_on_occupied_tile_is_rejected_and_unchanged() {
        let mut store = grid_with(3, 10);
        let before = store.clone();
        let err = plant(&mut store, &CropCatalog::default(), TileId(0), "corn").unwrap_err();
        assert_eq!(err, FarmError::TileOccupied(TileId(0)));
        assert_eq!(store, before);
    }

    #[test]
    fn plant_rejects_unknown_crop_and_tile() {
        let mut store = TileStore::new(1, 3);
        let catalog = CropCatalog::default();
        assert!(matches!(
            plant(&mut store, &catalog, TileId(0), "durian"),
            Err(FarmError::UnknownCrop(_))
        ));
        assert_eq!(
            plant(&mut store, &catalog, TileId(40), "corn"),
            Err(FarmError::TileNotFound(TileId(40)))
        );
        assert_eq!(store.planted_count(), 0);
    }

    #[test]
    fn manual_harvest_works_at_any_remaining_time() {
        let mut store = grid_with(9, 10);
        let mut inv = Inventory::new();
        let event = manual_harvest(&mut store, &mut inv, TileId(0)).unwrap();
        assert_eq!(event.count, 1);
        assert_eq!(inv.quantity("carrot"), 1);
        assert_eq!(crop_at(&store, 0).remaining_secs, 10);
    }

    #[test]
    fn manual_harvest_on_empty_tile_fails() {
        let mut store = TileStore::new(1, 3);
        let mut inv = Inventory::new();
        assert_eq!(
            manual_harvest(&mut store, &mut inv, TileId(1)),
            Err(FarmError::TileEmpty(TileId(1)))
        );
        assert_eq!(
            manual_harvest(&mut store, &mut inv, TileId(7)),
            Err(FarmError::TileNotFound(TileId(7)))
        );
        assert!(inv.is_empty());
    }

    #[test]
    fn removing_growing_tile_grants_nothing() {
        let mut store = grid_with(3, 10);
        let removed = remove_tile(&mut store, TileId(0)).unwrap();
        assert_eq!(removed.unwrap().remaining_secs, 3);
        let tile = store.get(TileId(0)).unwrap();
        assert!(tile.is_empty());
        assert!(tile.crop().is_none());
    }

    #[test]
    fn removing_empty_tile_is_allowed() {
        let mut store = TileStore::new(1, 3);
        assert_eq!(remove_tile(&mut store, TileId(1)), Ok(None));
        assert!(remove_tile(&mut store, TileId(3)).is_err());
    }
}
