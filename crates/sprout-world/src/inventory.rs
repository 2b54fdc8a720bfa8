//! Harvested crop counts.
//!
//! Absence means "none held": a crop whose count drops to zero is removed
//! from the map, never kept as a zero entry. All arithmetic is checked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FarmError;

/// Crop name to held quantity, with no zero entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<String, u64>,
}

impl Inventory {
    /// An empty inventory.
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Build from a raw map, dropping zero quantities.
    pub fn from_map(items: BTreeMap<String, u64>) -> Self {
        Self {
            items: items.into_iter().filter(|(_, qty)| *qty > 0).collect(),
        }
    }

    /// Quantity held of `crop` (zero if absent).
    pub fn quantity(&self, crop: &str) -> u64 {
        self.items.get(crop).copied().unwrap_or(0)
    }

    /// Add `amount` units of `crop`. Adding zero is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::ArithmeticOverflow`] if the count would overflow.
    pub fn add(&mut self, crop: &str, amount: u64) -> Result<(), FarmError> {
        if amount == 0 {
            return Ok(());
        }
        let current = self.quantity(crop);
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| FarmError::ArithmeticOverflow {
                context: format!("inventory count for {crop}"),
            })?;
        self.items.insert(crop.to_owned(), updated);
        Ok(())
    }

    /// Remove `amount` units of `crop`, deleting the entry at zero.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::InvalidQuantity`] for a zero amount and
    /// [`FarmError::InsufficientInventory`] if less than `amount` is held.
    pub fn remove(&mut self, crop: &str, amount: u64) -> Result<(), FarmError> {
        if amount == 0 {
            return Err(FarmError::InvalidQuantity);
        }
        let held = self.quantity(crop);
        let remaining = held
            .checked_sub(amount)
            .ok_or_else(|| FarmError::InsufficientInventory {
                crop: crop.to_owned(),
                requested: amount,
                held,
            })?;

        if remaining == 0 {
            self.items.remove(crop);
        } else {
            self.items.insert(crop.to_owned(), remaining);
        }
        Ok(())
    }

    /// Credit every entry of a harvest summary.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::ArithmeticOverflow`] if any count would overflow.
    /// Entries before the failing one stay credited.
    pub fn credit_all(&mut self, harvests: &BTreeMap<String, u64>) -> Result<(), FarmError> {
        for (crop, amount) in harvests {
            self.add(crop, *amount)?;
        }
        Ok(())
    }

    /// Borrow the underlying map.
    pub const fn as_map(&self) -> &BTreeMap<String, u64> {
        &self.items
    }

    /// Entries in crop-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.items.iter()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all held quantities, saturating.
    pub fn total(&self) -> u64 {
        self.items
            .values()
            .fold(0_u64, |acc, qty| acc.saturating_add(*qty))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_all_deletes_entry() {
        let mut inv = Inventory::new();
        inv.add("carrot", 3).unwrap();
        assert_eq!(inv.quantity("carrot"), 3);

        inv.remove("carrot", 3).unwrap();
        assert_eq!(inv.quantity("carrot"), 0);
        assert!(inv.as_map().get("carrot").is_none());
        assert!(inv.is_empty());
    }

    #[test]
    fn partial_remove_keeps_remainder() {
        let mut inv = Inventory::new();
        inv.add("corn", 5).unwrap();
        inv.remove("corn", 2).unwrap();
        assert_eq!(inv.quantity("corn"), 3);
    }

    #[test]
    fn remove_more_than_held_is_rejected_and_unchanged() {
        let mut inv = Inventory::new();
        inv.add("corn", 2).unwrap();
        let err = inv.remove("corn", 3).unwrap_err();
        assert_eq!(
            err,
            FarmError::InsufficientInventory {
                crop: String::from("corn"),
                requested: 3,
                held: 2,
            }
        );
        assert_eq!(inv.quantity("corn"), 2);
    }

    #[test]
    fn remove_zero_is_invalid() {
        let mut inv = Inventory::new();
        assert_eq!(inv.remove("corn", 0), Err(FarmError::InvalidQuantity));
    }

    #[test]
    fn add_zero_creates_no_entry() {
        let mut inv = Inventory::new();
        inv.add("apple", 0).unwrap();
        assert!(inv.is_empty());
    }

    #[test]
    fn add_overflow_is_reported() {
        let mut inv = Inventory::new();
        inv.add("apple", u64::MAX).unwrap();
        assert!(matches!(
            inv.add("apple", 1),
            Err(FarmError::ArithmeticOverflow { .. })
        ));
        assert_eq!(inv.quantity("apple"), u64::MAX);
    }

    #[test]
    fn from_map_drops_zero_entries() {
        let mut raw = BTreeMap::new();
        raw.insert(String::from("carrot"), 0);
        raw.insert(String::from("corn"), 4);
        let inv = Inventory::from_map(raw);
        assert_eq!(inv.as_map().len(), 1);
        assert_eq!(inv.total(), 4);
    }

    #[test]
    fn credit_all_merges_summary() {
        let mut inv = Inventory::new();
        inv.add("carrot", 1).unwrap();
        let mut summary = BTreeMap::new();
        summary.insert(String::from("carrot"), 2);
        summary.insert(String::from("tomato"), 5);
        inv.credit_all(&summary).unwrap();
        assert_eq!(inv.quantity("carrot"), 3);
        assert_eq!(inv.quantity("tomato"), 5);
    }
}
