//! Crops, tiles, growth, and offline catch-up for the Sprout idle farm.
//!
//! Everything in this crate is synchronous and deterministic. Time enters
//! only as whole seconds (one [`growth::tick`] per second) or as a pair of
//! epoch-millisecond timestamps ([`offline::reconcile`]).
//!
//! # Modules
//!
//! - [`catalog`] -- Immutable crop catalog, validated once at startup.
//! - [`error`] -- Error types for farm operations.
//! - [`growth`] -- Per-second advancement, auto-harvest-and-replant, and
//!   player actions on tiles.
//! - [`inventory`] -- Harvested crop counts with no zero entries.
//! - [`market`] -- Selling inventory for gold.
//! - [`offline`] -- Fast-forward of growth across a closed-game gap.
//! - [`tiles`] -- The ordered tile grid addressed by stable id.

pub mod catalog;
pub mod error;
pub mod growth;
pub mod inventory;
pub mod market;
pub mod offline;
pub mod tiles;

// Re-export primary types at crate root.
pub use catalog::{CropCatalog, DEFAULT_COLUMNS, DEFAULT_ROWS};
pub use error::FarmError;
pub use growth::{HarvestEvent, TickReport};
pub use inventory::Inventory;
pub use market::Sale;
pub use offline::{Reconciliation, reconcile};
pub use tiles::TileStore;
