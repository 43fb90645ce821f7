use super::config::PrepConfig;
use super::progress::ProgressReporter;
use crate::core::io::checkpoint::CheckpointStore;
use crate::core::models::job::JobDescriptor;
use std::path::{Path, PathBuf};

/// Shared, read-only surroundings of one phase: the job identity, the
/// configuration the phase runs with, the checkpoint store, and the progress
/// reporter. The engine context itself is passed separately because each
/// phase owns its engine exclusively.
pub struct PrepContext<'a> {
    pub job: &'a JobDescriptor,
    pub config: &'a PrepConfig,
    pub store: &'a CheckpointStore,
    pub reporter: &'a ProgressReporter<'a>,
}

impl PrepContext<'_> {
    /// Output directory of the run (the checkpoint store's directory).
    pub fn output_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Path of the per-cycle observable log for a phase tag.
    pub fn log_path(&self, tag: &str) -> PathBuf {
        self.output_dir()
            .join(format!("{}_{tag}.out", self.job.basename))
    }

    /// Path of the trajectory written by the sampling phases.
    pub fn trajectory_path(&self, tag: &str) -> PathBuf {
        self.output_dir()
            .join(format!("{}_{tag}_traj.pdb", self.job.basename))
    }
}
