//! In-process document store.
//!
//! Documents are kept as their JSON encoding so reads and writes go through
//! the same serde path as a real backend. Failure switches and a write delay
//! let tests drive the recovery paths of the save scheduler.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use sprout_types::GameDocument;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::DocumentStore;

/// Document store backed by a map in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay_ms: AtomicU64,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail until switched off.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail until switched off.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every subsequent `set` by `delay` before it lands.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Store raw JSON under `key`, bypassing encoding.
    pub async fn insert_raw(&self, key: &str, json: impl Into<String>) {
        self.documents
            .write()
            .await
            .insert(key.to_owned(), json.into());
    }

    /// Raw JSON currently stored under `key`.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.documents.read().await.get(key).cloned()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<GameDocument>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(String::from("reads disabled")));
        }
        let raw = self.documents.read().await.get(key).cloned();
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn set(&self, key: &str, document: &GameDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string(document)?;

        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(String::from("writes disabled")));
        }

        self.documents.write().await.insert(key.to_owned(), json);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
