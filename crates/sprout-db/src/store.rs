//! The document store trait.

use std::future::Future;

use sprout_types::GameDocument;

use crate::error::StoreError;

/// Asynchronous, fallible key/document storage.
///
/// `get` returns `Ok(None)` when no document exists under the key. `set`
/// overwrites whatever was there.
pub trait DocumentStore: Send + Sync + 'static {
    /// Read the document stored at `key`.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<GameDocument>, StoreError>> + Send;

    /// Replace the document stored at `key`.
    fn set(
        &self,
        key: &str,
        document: &GameDocument,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
