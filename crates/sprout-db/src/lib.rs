//! Persistence boundary for the Sprout idle farm.
//!
//! Each user owns exactly one [`GameDocument`](sprout_types::GameDocument),
//! stored under the key returned by
//! [`UserId::document_key`](sprout_types::UserId::document_key). Every write
//! replaces the whole document; there are no field-level merges.
//!
//! # Modules
//!
//! - [`store`] -- The [`DocumentStore`] trait the session talks to
//! - [`memory`] -- In-process store, used by tests and ephemeral runs
//! - [`file`] -- One JSON file per document on local disk
//! - [`error`] -- Shared error types

pub mod error;
pub mod file;
pub mod memory;
pub mod store;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::DocumentStore;
