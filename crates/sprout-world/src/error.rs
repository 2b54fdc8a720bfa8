//! Error types for the `sprout-world` crate.
//!
//! Every variant is a rejected player action or a guarded arithmetic
//! failure. None of them are fatal: callers report them and carry on.

use sprout_types::TileId;

/// Errors that can occur during farm operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FarmError {
    /// No tile with this id exists on the grid.
    #[error("tile not found: {0}")]
    TileNotFound(TileId),

    /// The tile already has a crop in the ground.
    #[error("tile {0} is already planted")]
    TileOccupied(TileId),

    /// The tile has nothing planted.
    #[error("tile {0} is empty")]
    TileEmpty(TileId),

    /// The crop name is not in the catalog.
    #[error("unknown crop: {0}")]
    UnknownCrop(String),

    /// Tried to sell more than is held.
    #[error("not enough {crop}: requested {requested}, held {held}")]
    InsufficientInventory {
        /// Crop being sold.
        crop: String,
        /// Quantity requested.
        requested: u64,
        /// Quantity actually held.
        held: u64,
    },

    /// A quantity of zero was requested.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A catalog entry failed validation.
    #[error("invalid crop catalog: {reason}")]
    InvalidCatalog {
        /// Explanation of what is wrong with the catalog.
        reason: String,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Which computation overflowed.
        context: String,
    },
}
