//! Durable record of notification ids that have already been relayed.
//!
//! The file is a single JSON array of strings. Writes go to a sibling
//! `.tmp` file which is then renamed over the target, so a reader never
//! sees a half-written array.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use octorelay_common::error::RelayError;

/// Set of notification ids already delivered. Never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedSet {
    ids: BTreeSet<String>,
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for NotifiedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// File-backed store for the [`NotifiedSet`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Open the store at `path`, creating the containing directory if needed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RelayError> {
        let path: PathBuf = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| RelayError::StorageWrite {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted set. A missing file yields an empty set.
    pub async fn load(&self) -> Result<NotifiedSet, RelayError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No state file found, starting empty");
                return Ok(NotifiedSet::new());
            }
            Err(source) => {
                return Err(RelayError::StorageRead {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let ids: Vec<String> =
            serde_json::from_slice(&bytes).map_err(|e| RelayError::StorageCorruption {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let set: NotifiedSet = ids.into_iter().collect();
        tracing::info!(path = %self.path.display(), count = set.len(), "Loaded notified ids");
        Ok(set)
    }

    /// Persist the full set, replacing the previous file atomically.
    pub async fn save(&self, set: &NotifiedSet) -> Result<(), RelayError> {
        let write_err = |source| RelayError::StorageWrite {
            path: self.path.clone(),
            source,
        };

        let body = encode(set).map_err(|e| write_err(e.into()))?;

        let tmp = self.tmp_path();

        let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
        file.write_all(&body).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), count = set.len(), "Persisted notified ids");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// JSON array of the set's ids.
fn encode(set: &NotifiedSet) -> Result<Vec<u8>, serde_json::Error> {
    let ids: Vec<&str> = set.iter().collect();
    serde_json::to_vec(&ids)
}
