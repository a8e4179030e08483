//! JSON snapshot file.
//!
//! The whole store is one JSON document,
//! `{"Counters": {...}, "Gauges": {...}}`, overwritten on every save.
//! Loading replaces both tables wholesale.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use metricsd_types::Snapshot;

use crate::error::DbError;

/// Snapshot persistence to a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Bind the store to a file path. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot file.
    ///
    /// Returns `Ok(None)` when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file cannot be read, or
    /// [`DbError::Serialization`] if it is not a valid snapshot.
    pub async fn load(&self) -> Result<Option<Snapshot>, DbError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No snapshot file to restore");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        tracing::info!(
            path = %self.path.display(),
            metrics = snapshot.len(),
            "Loaded snapshot file"
        );
        Ok(Some(snapshot))
    }

    /// Overwrite the snapshot file with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] or [`DbError::Io`] on failure.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), DbError> {
        let bytes = serde_json::to_vec(snapshot)?;
        tokio::fs::write(&self.path, bytes).await?;
        tracing::debug!(
            path = %self.path.display(),
            metrics = snapshot.len(),
            "Wrote snapshot file"
        );
        Ok(())
    }
}
