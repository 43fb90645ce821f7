use crate::core::io::pdb;
use crate::core::models::snapshot::Snapshot;
use crate::core::models::topology::Topology;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File suffix of serialized checkpoints.
pub const CHECKPOINT_SUFFIX: &str = "chk";

/// File suffix of companion structure snapshots.
pub const STRUCTURE_SUFFIX: &str = "pdb";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read checkpoint '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("checkpoint '{path}' is corrupt: {message}", path = path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Durable, named snapshots enabling phase-to-phase handoff and restart.
///
/// Every artifact is keyed by `"{basename}_{tag}"`. Checkpoints are written
/// to a sibling temp file and renamed into place, so a crash mid-write leaves
/// the previous checkpoint intact rather than a truncated file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint keyed by `basename` and `tag`.
    pub fn checkpoint_path(&self, basename: &str, tag: &str) -> PathBuf {
        self.dir
            .join(format!("{basename}_{tag}.{CHECKPOINT_SUFFIX}"))
    }

    /// Path of the companion structure snapshot for the same key.
    pub fn structure_path(&self, basename: &str, tag: &str) -> PathBuf {
        self.dir.join(format!("{basename}_{tag}.{STRUCTURE_SUFFIX}"))
    }

    pub fn exists(&self, basename: &str, tag: &str) -> bool {
        self.checkpoint_path(basename, tag).is_file()
    }

    /// Persists a snapshot under `"{basename}_{tag}"` and returns its path.
    pub fn save(&self, basename: &str, tag: &str, snapshot: &Snapshot) -> Result<PathBuf, StoreError> {
        let path = self.checkpoint_path(basename, tag);
        let body = toml::to_string(snapshot)?;
        let tmp = path.with_extension(format!("{CHECKPOINT_SUFFIX}.tmp"));
        fs::write(&tmp, body).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Restores the snapshot written under `"{basename}_{tag}"`.
    pub fn load(&self, basename: &str, tag: &str) -> Result<Snapshot, StoreError> {
        let path = self.checkpoint_path(basename, tag);
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let snapshot: Snapshot = toml::from_str(&text).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        if !snapshot.is_consistent() {
            return Err(StoreError::Corrupt {
                path,
                message: "position and velocity counts differ".to_string(),
            });
        }
        Ok(snapshot)
    }

    /// Writes the companion structure snapshot for the same key.
    pub fn save_structure(
        &self,
        basename: &str,
        tag: &str,
        topology: &Topology,
        snapshot: &Snapshot,
    ) -> Result<PathBuf, StoreError> {
        let path = self.structure_path(basename, tag);
        pdb::write_structure(&path, topology, snapshot).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
