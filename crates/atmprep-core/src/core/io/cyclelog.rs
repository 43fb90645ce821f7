use crate::core::models::observables::CycleRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize cycle record: {0}")]
    Serialize(#[from] csv::Error),
}

/// Append-only, space-delimited log of per-cycle observables.
///
/// One row per completed cycle, flushed after every write so a partial run
/// leaves a usable partial log. No header row; consumers rely on the
/// positional field order of [`CycleRecord`].
pub struct CycleLog {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: u64,
}

impl CycleLog {
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path)?;
        let writer = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_writer(file);
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn append(&mut self, record: &CycleRecord) -> Result<(), ReportError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::alchemy::{AlchemicalState, SoftCoreParams};
    use crate::core::models::observables::Observables;

    fn sample_record(lambda: f64) -> CycleRecord {
        let state = AlchemicalState::at_lambda(lambda, &SoftCoreParams::default());
        let observables = Observables {
            potential_energy: -5000.25,
            perturbation_energy: 3.5,
            temperature: 299.0,
            volume: 27000.0,
        };
        CycleRecord::new(300.0, &state, &observables)
    }

    #[test]
    fn rows_are_space_delimited_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("complex_mdlambda.out");
        let mut log = CycleLog::create(&path).unwrap();
        log.append(&sample_record(0.0)).unwrap();
        log.append(&sample_record(0.01)).unwrap();
        assert_eq!(log.rows(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let fields: Vec<&str> = lines[0].split(' ').collect();
        assert_eq!(fields.len(), 9);
        // Positional order: temperature, lambda, lambda1, lambda2, alpha,
        // u0, w0, potential energy, perturbation energy.
        assert_eq!(fields[0].parse::<f64>().unwrap(), 300.0);
        assert_eq!(fields[1].parse::<f64>().unwrap(), 0.0);
        assert_eq!(fields[7].parse::<f64>().unwrap(), -5000.25);
        assert_eq!(fields[8].parse::<f64>().unwrap(), 3.5);
    }

    #[test]
    fn every_row_is_flushed_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("complex_therm.out");
        let mut log = CycleLog::create(&path).unwrap();
        log.append(&sample_record(0.0)).unwrap();

        // Read back while the writer is still alive.
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
