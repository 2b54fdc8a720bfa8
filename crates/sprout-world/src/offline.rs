//! Offline catch-up.
//!
//! While the game is closed nothing ticks. On the next load the gap between
//! the document's `lastUpdated` stamp and now is replayed against every
//! growing tile in one step, producing exactly what that many calls to
//! [`growth::tick`](crate::growth::tick) would have produced.
//!
//! Only whole cycles yield. Time left over after the last completed cycle
//! counts down the next one but is never paid out.

use std::collections::BTreeMap;

use sprout_types::{GrowingCrop, Tile};

/// Outcome of replaying an offline gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Tiles after the fast-forward, in input order.
    pub tiles: Vec<Tile>,
    /// Crop name to units harvested while offline. Only non-zero entries.
    pub harvests: BTreeMap<String, u64>,
    /// Whole seconds replayed.
    pub elapsed_secs: u64,
}

impl Reconciliation {
    /// Total units harvested across all crops.
    pub fn total_harvested(&self) -> u64 {
        self.harvests
            .values()
            .fold(0_u64, |acc, qty| acc.saturating_add(*qty))
    }
}

/// Whole seconds between two epoch-millisecond stamps.
///
/// A clock that went backwards counts as no time at all.
pub fn elapsed_secs(last_updated_ms: i64, now_ms: i64) -> u64 {
    let diff = now_ms.saturating_sub(last_updated_ms).max(0);
    u64::try_from(diff.checked_div(1000).unwrap_or(0)).unwrap_or(0)
}

/// Fast-forward `tiles` across the gap from `last_updated_ms` to `now_ms`.
///
/// Empty tiles and tiles with a zero-length cycle come back unchanged.
pub fn reconcile(tiles: Vec<Tile>, last_updated_ms: i64, now_ms: i64) -> Reconciliation {
    let elapsed = elapsed_secs(last_updated_ms, now_ms);
    let mut harvests: BTreeMap<String, u64> = BTreeMap::new();

    let tiles: Vec<Tile> = tiles
        .into_iter()
        .map(|mut tile| {
            if let Some(crop) = tile.crop_mut() {
                let cycles = advance(crop, elapsed);
                if cycles > 0 {
                    let entry = harvests.entry(crop.crop.clone()).or_insert(0);
                    *entry = entry.saturating_add(cycles);
                }
            }
            tile
        })
        .collect();

    let result = Reconciliation {
        tiles,
        harvests,
        elapsed_secs: elapsed,
    };
    tracing::debug!(
        elapsed_secs = elapsed,
        harvested = result.total_harvested(),
        "offline progress reconciled"
    );
    result
}

/// Advance one crop by `budget` seconds and return the completed cycles.
fn advance(crop: &mut GrowingCrop, budget: u64) -> u64 {
    if !crop.is_eligible() {
        return 0;
    }

    let remaining = u64::from(crop.remaining_secs);
    let cycle = u64::from(crop.grow_duration_secs);

    // Already at zero, or not enough time to finish the current cycle.
    if remaining == 0 || budget < remaining {
        let left = remaining.saturating_sub(budget);
        crop.remaining_secs = u32::try_from(left).unwrap_or(crop.remaining_secs);
        crop.ready = crop.remaining_secs == 0;
        return 0;
    }

    let after_first = budget.saturating_sub(remaining);
    let extra_cycles = after_first.checked_div(cycle).unwrap_or(0);
    let into_next = after_first.checked_rem(cycle).unwrap_or(0);

    let left = cycle.saturating_sub(into_next);
    crop.remaining_secs = u32::try_from(left).unwrap_or(crop.grow_duration_secs);
    crop.ready = crop.remaining_secs == 0;
    extra_cycles.saturating_add(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use sprout_types::{TileId, TileState};

    use super::*;

    fn growing(id: u32, crop: &str, remaining: u32, duration: u32) -> Tile {
        let mut tile = Tile::empty(TileId(id), 15);
        tile.state = TileState::Growing(GrowingCrop {
            crop: crop.to_owned(),
            grow_duration_secs: duration,
            remaining_secs: remaining,
            ready: remaining == 0,
        });
        tile
    }

    #[test]
    fn twenty_five_seconds_on_a_ten_second_crop() {
        let result = reconcile(vec![growing(0, "carrot", 10, 10)], 0, 25_000);
        assert_eq!(result.elapsed_secs, 25);
        assert_eq!(result.harvests.get("carrot"), Some(&2));
        assert_eq!(result.tiles[0].crop().unwrap().remaining_secs, 5);
    }

    #[test]
    fn partial_seconds_are_floored() {
        let result = reconcile(vec![growing(0, "carrot", 10, 10)], 1_000, 10_999);
        assert_eq!(result.elapsed_secs, 9);
        assert!(result.harvests.is_empty());
        assert_eq!(result.tiles[0].crop().unwrap().remaining_secs, 1);
    }

    #[test]
    fn partial_cycle_is_not_credited() {
        let result = reconcile(vec![growing(0, "corn", 15, 15)], 0, 14_000);
        assert_eq!(result.total_harvested(), 0);
        assert_eq!(result.tiles[0].crop().unwrap().remaining_secs, 1);
    }

    #[test]
    fn exact_cycle_boundary_replants_fully() {
        let result = reconcile(vec![growing(0, "corn", 15, 15)], 0, 30_000);
        assert_eq!(result.harvests.get("corn"), Some(&2));
        let crop = result.tiles[0].crop().unwrap();
        assert_eq!(crop.remaining_secs, 15);
        assert!(!crop.ready);
    }

    #[test]
    fn clock_skew_counts_as_zero() {
        let tiles = vec![growing(0, "carrot", 4, 10)];
        let result = reconcile(tiles.clone(), 50_000, 10_000);
        assert_eq!(result.elapsed_secs, 0);
        assert_eq!(result.tiles, tiles);
    }

    #[test]
    fn days_offline_do_not_iterate() {
        let week_ms = 604_800_000;
        let result = reconcile(vec![growing(0, "apple", 30, 30)], 0, week_ms);
        assert_eq!(result.harvests.get("apple"), Some(&20_160));
        assert_eq!(result.tiles[0].crop().unwrap().remaining_secs, 30);
    }

    #[test]
    fn empty_and_inert_tiles_are_untouched() {
        let tiles = vec![Tile::empty(TileId(0), 15), growing(1, "carrot", 0, 0)];
        let result = reconcile(tiles.clone(), 0, 100_000);
        assert_eq!(result.tiles, tiles);
        assert!(result.harvests.is_empty());
    }

    #[test]
    fn harvests_aggregate_per_crop() {
        let tiles = vec![
            growing(0, "carrot", 10, 10),
            growing(1, "carrot", 5, 10),
            growing(2, "tomato", 20, 20),
        ];
        let result = reconcile(tiles, 0, 20_000);
        assert_eq!(result.harvests.get("carrot"), Some(&4));
        assert_eq!(result.harvests.get("tomato"), Some(&1));
        assert_eq!(result.total_harvested(), 5);
    }
}
