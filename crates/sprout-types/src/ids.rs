//! Typed identifiers for tiles, users, and sessions.
//!
//! Tiles are addressed by a small stable integer that also determines their
//! grid position. Users come from the identity provider as opaque strings.
//! Sessions use UUID v7 (time-ordered) so log lines of one login sort
//! naturally.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stable identity of a single plot on the farm grid.
///
/// Ids are never reused within a session. The grid position is derived
/// from the id and the column count, see [`TileId::position`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct TileId(pub u32);

impl TileId {
    /// Return the raw integer id.
    pub const fn into_inner(self) -> u32 {
        self.0
    }

    /// Derive `(row, col)` for this tile on a grid with `columns` columns.
    ///
    /// A zero column count is treated as a single row.
    pub const fn position(self, columns: u32) -> (u32, u32) {
        match (self.0.checked_div(columns), self.0.checked_rem(columns)) {
            (Some(row), Some(col)) => (row, col),
            _ => (0, self.0),
        }
    }
}

impl core::fmt::Display for TileId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TileId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identity-provider user id. One persisted farm document exists per user.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a raw user id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Document-store key holding this user's farm.
    pub fn document_key(&self) -> String {
        format!("farm:{}", self.0)
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for one login session, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new session identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_follows_row_major_order() {
        assert_eq!(TileId(0).position(15), (0, 0));
        assert_eq!(TileId(14).position(15), (0, 14));
        assert_eq!(TileId(15).position(15), (1, 0));
        assert_eq!(TileId(149).position(15), (9, 14));
    }

    #[test]
    fn position_with_zero_columns_does_not_divide() {
        assert_eq!(TileId(7).position(0), (0, 7));
    }

    #[test]
    fn document_key_is_namespaced() {
        assert_eq!(UserId::new("abc123").document_key(), "farm:abc123");
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_ne!(SessionId::new().into_inner(), Uuid::nil());
    }

    #[test]
    fn tile_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&TileId(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));
    }
}
