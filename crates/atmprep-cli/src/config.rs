use crate::cli::Cli;
use crate::error::{CliError, Result};
use atmprep::core::models::alchemy::SoftCoreParams;
use atmprep::core::models::job::JobDescriptor;
use atmprep::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default sampling interval when a step budget omits it.
const DEFAULT_STEPS_PER_CYCLE: u64 = 5_000;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct PartialJobConfig {
    basename: Option<String>,
    topology: Option<PathBuf>,
    coordinates: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct PartialSystemConfig {
    /// Target temperature in kelvin.
    temperature: Option<f64>,
    /// Thermalization start temperature in kelvin.
    initial_temperature: Option<f64>,
    platform: Option<String>,
    /// Integration time step in picoseconds.
    time_step: Option<f64>,
    /// Langevin friction coefficient in 1/ps.
    friction: Option<f64>,
    /// Nonbonded cutoff in nanometers.
    nonbonded_cutoff: Option<f64>,
    /// Barostat pressure in bar.
    pressure: Option<f64>,
    barostat_interval: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct PartialAtomsConfig {
    ligand1: Option<Vec<usize>>,
    ligand2: Option<Vec<usize>>,
    /// Three alignment reference atoms per ligand, relative to the first
    /// atom of that ligand.
    ligand1_ref: Option<Vec<usize>>,
    ligand2_ref: Option<Vec<usize>>,
    receptor_cm: Option<Vec<usize>>,
    /// Displacement vector between the two end states, in Å.
    displacement: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct PartialRestraintsConfig {
    atoms: Option<Vec<usize>>,
    /// Force constant in kcal/mol/Å².
    force_constant: Option<f64>,
    /// Flat-bottom tolerance in Å.
    tolerance: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct PartialSoftcoreConfig {
    umax: Option<f64>,
    ubcore: Option<f64>,
    acore: Option<f64>,
    direction: Option<i32>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
struct PartialRunLength {
    total_steps: Option<u64>,
    steps_per_cycle: Option<u64>,
}

impl PartialRunLength {
    fn merge(self, default_total: u64) -> core_config::RunLength {
        core_config::RunLength {
            total_steps: self.total_steps.unwrap_or(default_total),
            steps_per_cycle: self.steps_per_cycle.unwrap_or(DEFAULT_STEPS_PER_CYCLE),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct PartialStepsConfig {
    mintherm: Option<PartialRunLength>,
    annealing: Option<PartialRunLength>,
    equilibration: Option<PartialRunLength>,
}

/// The run-configuration file as written by the operator; every field the
/// protocol has a default for may be omitted. Unknown keys are ignored.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PartialPrepConfig {
    job: Option<PartialJobConfig>,
    system: Option<PartialSystemConfig>,
    atoms: Option<PartialAtomsConfig>,
    restraints: Option<PartialRestraintsConfig>,
    softcore: Option<PartialSoftcoreConfig>,
    steps: Option<PartialStepsConfig>,
}

/// Fully resolved run inputs after merging the file with the command line.
#[derive(Debug)]
pub struct AppConfig {
    pub job: JobDescriptor,
    pub core_config: core_config::PrepConfig,
    pub output_dir: PathBuf,
}

impl PartialPrepConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, cli: &Cli) -> Result<AppConfig> {
        let job_config = self.job.take().unwrap_or_default();
        let system = self.system.take().unwrap_or_default();
        let atoms = self.atoms.take().unwrap_or_default();
        let restraints = self.restraints.take().unwrap_or_default();
        let softcore = self.softcore.take().unwrap_or_default();
        let steps = self.steps.take().unwrap_or_default();

        let basename = job_config
            .basename
            .ok_or_else(|| CliError::Config("`job.basename` is required.".to_string()))?;
        let defaults = JobDescriptor::from_basename(&basename);
        let job = JobDescriptor::new(
            basename,
            job_config.topology.unwrap_or(defaults.topology_path),
            job_config.coordinates.unwrap_or(defaults.coordinates_path),
        );

        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| job.topology_path.parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut builder = core_config::PrepConfig::builder()
            .ligand1_atoms(atoms.ligand1.ok_or_else(|| {
                CliError::Config("`atoms.ligand1` is required.".to_string())
            })?)
            .displacement(atoms.displacement.ok_or_else(|| {
                CliError::Config("`atoms.displacement` is required.".to_string())
            })?);

        if let Some(ligand2) = atoms.ligand2 {
            builder = builder.ligand2_atoms(ligand2);
        }
        if let Some(ligand1_ref) = atoms.ligand1_ref {
            builder = builder.ligand1_ref_atoms(ligand1_ref);
        }
        if let Some(ligand2_ref) = atoms.ligand2_ref {
            builder = builder.ligand2_ref_atoms(ligand2_ref);
        }
        if let Some(receptor_cm) = atoms.receptor_cm {
            builder = builder.receptor_cm_atoms(receptor_cm);
        }

        if let Some(temperature) = system.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(initial) = system.initial_temperature {
            builder = builder.initial_temperature(initial);
        }
        if let Some(name) = &system.platform {
            let platform = core_config::Platform::from_name(name).ok_or_else(|| {
                CliError::Config(format!("Unknown platform in `system.platform`: '{name}'."))
            })?;
            builder = builder.platform(platform);
        }
        if let Some(time_step) = system.time_step {
            builder = builder.time_step_ps(time_step);
        }
        if let Some(friction) = system.friction {
            builder = builder.friction_per_ps(friction);
        }
        if let Some(cutoff) = system.nonbonded_cutoff {
            builder = builder.nonbonded_cutoff_nm(cutoff);
        }
        if let Some(pressure) = system.pressure {
            builder = builder.pressure_bar(pressure);
        }
        if let Some(interval) = system.barostat_interval {
            builder = builder.barostat_interval(interval);
        }

        builder = builder.restraints(Self::merge_restraints(restraints));
        builder = builder.softcore(Self::merge_softcore(softcore));

        if let Some(run) = steps.mintherm {
            builder = builder.mintherm(run.merge(150_000));
        }
        if let Some(run) = steps.annealing {
            builder = builder.annealing(run.merge(250_000));
        }
        if let Some(run) = steps.equilibration {
            builder = builder.equilibration(run.merge(150_000));
        }

        let core_config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AppConfig {
            job,
            core_config,
            output_dir,
        })
    }

    fn merge_restraints(partial: PartialRestraintsConfig) -> core_config::RestraintConfig {
        let defaults = core_config::RestraintConfig::default();
        core_config::RestraintConfig {
            atoms: partial.atoms.unwrap_or(defaults.atoms),
            force_constant: partial.force_constant.unwrap_or(defaults.force_constant),
            tolerance: partial.tolerance.unwrap_or(defaults.tolerance),
        }
    }

    fn merge_softcore(partial: PartialSoftcoreConfig) -> SoftCoreParams {
        let defaults = SoftCoreParams::default();
        SoftCoreParams {
            umax: partial.umax.unwrap_or(defaults.umax),
            ubcore: partial.ubcore.unwrap_or(defaults.ubcore),
            acore: partial.acore.unwrap_or(defaults.acore),
            direction: partial.direction.unwrap_or(defaults.direction),
        }
    }
}
