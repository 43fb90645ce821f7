use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::checkpoint::StoreError;
use crate::core::io::cyclelog::ReportError;

/// Failures are fatal at this layer: no phase is skipped or retried, recovery
/// is the operator re-running from the last good checkpoint.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine backend failure: {0}")]
    Backend(String),

    #[error("checkpoint of phase '{tag}' unavailable: {source}")]
    Checkpoint {
        tag: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("checkpoint store failure: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("cycle log failure: {source}")]
    Report {
        #[from]
        source: ReportError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[cfg(feature = "openmm")]
    #[error("Python exception from the OpenMM bridge: {0}")]
    Python(#[from] pyo3::PyErr),
}
