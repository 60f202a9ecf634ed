//! File-backed snapshot store with atomic replacement.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec::{decode, encode};
use crate::model::SessionSnapshot;
use crate::StoreError;

/// Writes snapshots via a sibling temp file plus rename, so an interrupted
/// checkpoint never leaves a half-written file where the next run would
/// find it.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist a checkpoint.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let bytes = encode(snapshot)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load the persisted snapshot, if any.
    pub fn load(&self) -> Result<SessionSnapshot, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound(self.path.display().to_string()));
        }
        let bytes = fs::read(&self.path)?;
        let snapshot = decode(&bytes)?;
        info!(
            path = %self.path.display(),
            steps = snapshot.step_count,
            states = snapshot.graph.nodes.len(),
            "loaded session snapshot"
        );
        Ok(snapshot)
    }

    /// Load if a usable snapshot exists; corrupt or foreign files are
    /// reported and skipped so the session starts fresh.
    pub fn load_if_usable(&self) -> Option<SessionSnapshot> {
        match self.load() {
            Ok(snapshot) => Some(snapshot),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unusable snapshot");
                None
            }
        }
    }
}
