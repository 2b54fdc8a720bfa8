//! File-backed document store.
//!
//! Each document lives in its own pretty-printed JSON file under a data
//! directory. Writes go to a temporary sibling first and are then renamed
//! over the target, so a crash mid-write leaves the previous document intact.
//!
//! # File Names
//!
//! | Key | File |
//! |-----|------|
//! | `farm:alice` | `farm_alice.json` |
//! | `farm:../x` | `farm____x.json` |

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sprout_types::GameDocument;

use crate::error::StoreError;
use crate::store::DocumentStore;

/// Document store writing one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!(path = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// Directory holding the documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file that stores `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize(key)))
    }
}

/// Map a key onto a safe file stem.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl DocumentStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<GameDocument>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, document: &GameDocument) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(document)?;

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key, bytes = bytes.len(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_become_flat_file_names() {
        assert_eq!(sanitize("farm:alice"), "farm_alice");
        assert_eq!(sanitize("farm:../x"), "farm____x");
        assert_eq!(sanitize("farm:user-01_b"), "farm_user-01_b");
    }
}
