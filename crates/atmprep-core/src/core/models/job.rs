use std::path::PathBuf;

/// Identifies the molecular system being prepared. Immutable per run.
///
/// The `basename` keys every file the run produces; topology and coordinates
/// are the raw engine-native inputs consumed by the first phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub basename: String,
    pub topology_path: PathBuf,
    pub coordinates_path: PathBuf,
}

impl JobDescriptor {
    pub fn new(
        basename: impl Into<String>,
        topology_path: impl Into<PathBuf>,
        coordinates_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            basename: basename.into(),
            topology_path: topology_path.into(),
            coordinates_path: coordinates_path.into(),
        }
    }

    /// Conventional Amber file pair: `{basename}.prmtop` / `{basename}.inpcrd`.
    pub fn from_basename(basename: impl Into<String>) -> Self {
        let basename = basename.into();
        let topology_path = PathBuf::from(format!("{basename}.prmtop"));
        let coordinates_path = PathBuf::from(format!("{basename}.inpcrd"));
        Self {
            basename,
            topology_path,
            coordinates_path,
        }
    }
}
