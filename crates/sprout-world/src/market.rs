//! Selling harvested crops for gold.

use serde::{Deserialize, Serialize};

use crate::catalog::CropCatalog;
use crate::error::FarmError;
use crate::inventory::Inventory;

/// Result of a successful sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Crop sold.
    pub crop: String,
    /// Units sold.
    pub quantity: u64,
    /// Gold credited to the wallet.
    pub gold_earned: u64,
}

/// Sell `quantity` units of `crop` at the catalog price.
///
/// Either both the inventory and the wallet change or neither does.
///
/// # Errors
///
/// Returns [`FarmError::InvalidQuantity`] for zero, [`FarmError::UnknownCrop`]
/// for a crop missing from the catalog, [`FarmError::InsufficientInventory`]
/// when selling more than is held, and [`FarmError::ArithmeticOverflow`] if
/// the earnings or the new balance would overflow.
pub fn sell(
    catalog: &CropCatalog,
    inventory: &mut Inventory,
    gold: &mut u64,
    crop: &str,
    quantity: u64,
) -> Result<Sale, FarmError> {
    if quantity == 0 {
        return Err(FarmError::InvalidQuantity);
    }
    let info = catalog.require(crop)?;

    let held = inventory.quantity(crop);
    if held < quantity {
        return Err(FarmError::InsufficientInventory {
            crop: crop.to_owned(),
            requested: quantity,
            held,
        });
    }

    let earned = info
        .sell_price
        .checked_mul(quantity)
        .ok_or_else(|| FarmError::ArithmeticOverflow {
            context: format!("sale value of {quantity} {crop}"),
        })?;
    let balance = gold
        .checked_add(earned)
        .ok_or_else(|| FarmError::ArithmeticOverflow {
            context: String::from("wallet balance"),
        })?;

    inventory.remove(crop, quantity)?;
    *gold = balance;

    tracing::debug!(crop, quantity, earned, balance, "sold crops");
    Ok(Sale {
        crop: crop.to_owned(),
        quantity,
        gold_earned: earned,
    })
}
