//! Shared type definitions for the Sprout idle farm.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace. The persisted document types flow downstream to
//! `TypeScript` via `ts-rs` so the browser client reads and writes the exact
//! same shape.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers (tiles, users, sessions)
//! - [`structs`] -- Crop catalog entries and tile state
//! - [`document`] -- The persisted farm document and its tile records

pub mod document;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use document::{DOCUMENT_VERSION, GameDocument, STARTING_GOLD, TileKind, TileRecord};
pub use ids::{SessionId, TileId, UserId};
pub use structs::{CropInfo, GrowingCrop, Tile, TileState};

#[cfg(test)]
mod tests {
    //! Binding generation for the persisted document types.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::TileId::export_all();
        let _ = crate::ids::UserId::export_all();
        let _ = crate::document::TileKind::export_all();
        let _ = crate::document::TileRecord::export_all();
        let _ = crate::document::GameDocument::export_all();
    }
}
