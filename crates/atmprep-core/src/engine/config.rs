use crate::core::models::alchemy::SoftCoreParams;
use crate::core::schedule::CyclePlan;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// Compute platform of the external engine. GPU-class platforms run in mixed
/// precision; the default substitution when no platform is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Cuda,
    OpenCl,
    Hip,
    Cpu,
    Reference,
}

impl Platform {
    /// Name the engine resolves the platform by.
    pub fn engine_name(&self) -> &'static str {
        match self {
            Platform::Cuda => "CUDA",
            Platform::OpenCl => "OpenCL",
            Platform::Hip => "HIP",
            Platform::Cpu => "CPU",
            Platform::Reference => "Reference",
        }
    }

    pub fn uses_mixed_precision(&self) -> bool {
        matches!(self, Platform::Cuda | Platform::OpenCl | Platform::Hip)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cuda" => Some(Platform::Cuda),
            "opencl" => Some(Platform::OpenCl),
            "hip" => Some(Platform::Hip),
            "cpu" => Some(Platform::Cpu),
            "reference" => Some(Platform::Reference),
            _ => None,
        }
    }
}

/// Step budget of one phase group: total integration steps and the sampling
/// interval after which observables are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLength {
    pub total_steps: u64,
    pub steps_per_cycle: u64,
}

impl RunLength {
    pub fn plan(&self) -> CyclePlan {
        CyclePlan::new(self.total_steps, self.steps_per_cycle)
    }
}

/// Flat-bottom positional restraints applied while the solvent equilibrates.
#[derive(Debug, Clone, PartialEq)]
pub struct RestraintConfig {
    /// Engine atom indices to restrain; empty disables the restraint force.
    pub atoms: Vec<usize>,
    /// Force constant in kcal/mol/Å².
    pub force_constant: f64,
    /// Flat-bottom tolerance in Å.
    pub tolerance: f64,
}

impl Default for RestraintConfig {
    fn default() -> Self {
        Self {
            atoms: Vec::new(),
            force_constant: 25.0,
            tolerance: 0.5,
        }
    }
}

/// Immutable, fully resolved run configuration.
///
/// Derived once from the external configuration file; phases never mutate it.
/// The annealing-era restraint rewrite is expressed as the pure transform
/// [`PrepConfig::with_solute_restraints`], which returns a new value and
/// leaves the base configuration untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepConfig {
    /// Target temperature in kelvin.
    pub temperature: f64,
    /// Thermalization start temperature in kelvin.
    pub initial_temperature: f64,
    pub platform: Platform,
    /// Integration time step in picoseconds.
    pub time_step_ps: f64,
    /// Langevin friction coefficient in 1/ps.
    pub friction_per_ps: f64,
    /// Nonbonded cutoff in nanometers.
    pub nonbonded_cutoff_nm: f64,
    /// Barostat pressure in bar.
    pub pressure_bar: f64,
    /// Barostat coupling interval (steps) while pressure coupling is enabled.
    pub barostat_interval: u64,
    /// Atoms of the ligand displaced out of the binding site.
    pub ligand1_atoms: Vec<usize>,
    /// Atoms of the second ligand (relative transfer setups); empty for
    /// absolute setups.
    pub ligand2_atoms: Vec<usize>,
    /// Three alignment reference atoms per ligand, indexed relative to the
    /// first atom of that ligand. Both sets present enables the
    /// ligand-ligand alignment restraint; both empty disables it.
    pub ligand1_ref_atoms: Vec<usize>,
    pub ligand2_ref_atoms: Vec<usize>,
    /// Displacement vector between the two end states, in Å.
    pub displacement: [f64; 3],
    pub restraints: RestraintConfig,
    /// Receptor atoms defining the binding-site center of mass for the Vsite
    /// restraint; empty disables it.
    pub receptor_cm_atoms: Vec<usize>,
    pub softcore: SoftCoreParams,
    /// Minimization/thermalization/NPT/NVT step budget.
    pub mintherm: RunLength,
    /// Alchemical annealing step budget.
    pub annealing: RunLength,
    /// Lambda-equilibration step budget.
    pub equilibration: RunLength,
}

impl PrepConfig {
    pub fn builder() -> PrepConfigBuilder {
        PrepConfigBuilder::default()
    }

    /// Configuration for the phases run with all solutes restrained: a 1 fs
    /// time step and positional restraints on every atom up to the last
    /// ligand atom (receptor and ligands), so only the solvent relaxes.
    ///
    /// Pure transform; `self` is the configuration the final equilibration
    /// phase runs with, unchanged.
    pub fn with_solute_restraints(&self) -> PrepConfig {
        let last_ligand_atom = self
            .ligand2_atoms
            .last()
            .or(self.ligand1_atoms.last())
            .copied()
            .unwrap_or(0);
        let mut config = self.clone();
        config.time_step_ps = 0.001;
        config.restraints.atoms = (0..=last_ligand_atom).collect();
        config
    }
}

#[derive(Debug, Default)]
pub struct PrepConfigBuilder {
    temperature: Option<f64>,
    initial_temperature: Option<f64>,
    platform: Option<Platform>,
    time_step_ps: Option<f64>,
    friction_per_ps: Option<f64>,
    nonbonded_cutoff_nm: Option<f64>,
    pressure_bar: Option<f64>,
    barostat_interval: Option<u64>,
    ligand1_atoms: Option<Vec<usize>>,
    ligand2_atoms: Option<Vec<usize>>,
    ligand1_ref_atoms: Option<Vec<usize>>,
    ligand2_ref_atoms: Option<Vec<usize>>,
    displacement: Option<[f64; 3]>,
    restraints: Option<RestraintConfig>,
    receptor_cm_atoms: Option<Vec<usize>>,
    softcore: Option<SoftCoreParams>,
    mintherm: Option<RunLength>,
    annealing: Option<RunLength>,
    equilibration: Option<RunLength>,
}

impl PrepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn initial_temperature(mut self, kelvin: f64) -> Self {
        self.initial_temperature = Some(kelvin);
        self
    }
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }
    pub fn time_step_ps(mut self, time_step: f64) -> Self {
        self.time_step_ps = Some(time_step);
        self
    }
    pub fn friction_per_ps(mut self, friction: f64) -> Self {
        self.friction_per_ps = Some(friction);
        self
    }
    pub fn nonbonded_cutoff_nm(mut self, cutoff: f64) -> Self {
        self.nonbonded_cutoff_nm = Some(cutoff);
        self
    }
    pub fn pressure_bar(mut self, pressure: f64) -> Self {
        self.pressure_bar = Some(pressure);
        self
    }
    pub fn barostat_interval(mut self, interval: u64) -> Self {
        self.barostat_interval = Some(interval);
        self
    }
    pub fn ligand1_atoms(mut self, atoms: Vec<usize>) -> Self {
        self.ligand1_atoms = Some(atoms);
        self
    }
    pub fn ligand2_atoms(mut self, atoms: Vec<usize>) -> Self {
        self.ligand2_atoms = Some(atoms);
        self
    }
    pub fn ligand1_ref_atoms(mut self, atoms: Vec<usize>) -> Self {
        self.ligand1_ref_atoms = Some(atoms);
        self
    }
    pub fn ligand2_ref_atoms(mut self, atoms: Vec<usize>) -> Self {
        self.ligand2_ref_atoms = Some(atoms);
        self
    }
    pub fn displacement(mut self, displacement: [f64; 3]) -> Self {
        self.displacement = Some(displacement);
        self
    }
    pub fn restraints(mut self, restraints: RestraintConfig) -> Self {
        self.restraints = Some(restraints);
        self
    }
    pub fn receptor_cm_atoms(mut self, atoms: Vec<usize>) -> Self {
        self.receptor_cm_atoms = Some(atoms);
        self
    }
    pub fn softcore(mut self, softcore: SoftCoreParams) -> Self {
        self.softcore = Some(softcore);
        self
    }
    pub fn mintherm(mut self, run: RunLength) -> Self {
        self.mintherm = Some(run);
        self
    }
    pub fn annealing(mut self, run: RunLength) -> Self {
        self.annealing = Some(run);
        self
    }
    pub fn equilibration(mut self, run: RunLength) -> Self {
        self.equilibration = Some(run);
        self
    }

    pub fn build(self) -> Result<PrepConfig, ConfigError> {
        let ligand1_atoms = self
            .ligand1_atoms
            .ok_or(ConfigError::MissingParameter("ligand1_atoms"))?;
        if ligand1_atoms.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ligand1_atoms",
                message: "at least one ligand atom is required".to_string(),
            });
        }
        let displacement = self
            .displacement
            .ok_or(ConfigError::MissingParameter("displacement"))?;

        let ligand2_atoms = self.ligand2_atoms.unwrap_or_default();
        let ligand1_ref_atoms = self.ligand1_ref_atoms.unwrap_or_default();
        let ligand2_ref_atoms = self.ligand2_ref_atoms.unwrap_or_default();
        if ligand1_ref_atoms.is_empty() != ligand2_ref_atoms.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ligand1_ref_atoms",
                message: "alignment reference atoms must be given for both ligands".to_string(),
            });
        }
        if !ligand1_ref_atoms.is_empty() {
            if ligand2_atoms.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "ligand1_ref_atoms",
                    message: "alignment reference atoms require a second ligand".to_string(),
                });
            }
            for (field, atoms) in [
                ("ligand1_ref_atoms", &ligand1_ref_atoms),
                ("ligand2_ref_atoms", &ligand2_ref_atoms),
            ] {
                if atoms.len() != 3 {
                    return Err(ConfigError::InvalidValue {
                        field,
                        message: format!(
                            "exactly three alignment reference atoms are required, got {}",
                            atoms.len()
                        ),
                    });
                }
            }
        }

        let config = PrepConfig {
            temperature: self.temperature.unwrap_or(300.0),
            initial_temperature: self.initial_temperature.unwrap_or(50.0),
            platform: self.platform.unwrap_or_default(),
            time_step_ps: self.time_step_ps.unwrap_or(0.001),
            friction_per_ps: self.friction_per_ps.unwrap_or(0.5),
            nonbonded_cutoff_nm: self.nonbonded_cutoff_nm.unwrap_or(0.9),
            pressure_bar: self.pressure_bar.unwrap_or(1.0),
            barostat_interval: self.barostat_interval.unwrap_or(25),
            ligand1_atoms,
            ligand2_atoms,
            ligand1_ref_atoms,
            ligand2_ref_atoms,
            displacement,
            restraints: self.restraints.unwrap_or_default(),
            receptor_cm_atoms: self.receptor_cm_atoms.unwrap_or_default(),
            softcore: self.softcore.unwrap_or_default(),
            mintherm: self.mintherm.unwrap_or(RunLength {
                total_steps: 150_000,
                steps_per_cycle: 5_000,
            }),
            annealing: self.annealing.unwrap_or(RunLength {
                total_steps: 250_000,
                steps_per_cycle: 5_000,
            }),
            equilibration: self.equilibration.unwrap_or(RunLength {
                total_steps: 150_000,
                steps_per_cycle: 5_000,
            }),
        };

        for (field, run) in [
            ("mintherm", config.mintherm),
            ("annealing", config.annealing),
            ("equilibration", config.equilibration),
        ] {
            if run.steps_per_cycle == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: "steps_per_cycle must be positive".to_string(),
                });
            }
            if run.total_steps < run.steps_per_cycle {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: format!(
                        "total_steps ({}) must cover at least one cycle of {} steps",
                        run.total_steps, run.steps_per_cycle
                    ),
                });
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_builder() -> PrepConfigBuilder {
        PrepConfig::builder()
            .ligand1_atoms(vec![120, 121, 122])
            .displacement([22.0, 22.0, 22.0])
    }

    #[test]
    fn defaults_match_the_preparation_protocol() {
        let config = minimal_builder().build().unwrap();
        assert_eq!(config.temperature, 300.0);
        assert_eq!(config.initial_temperature, 50.0);
        assert_eq!(config.platform, Platform::Cuda);
        assert_eq!(config.barostat_interval, 25);
        assert_eq!(config.mintherm.total_steps, 150_000);
        assert_eq!(config.annealing.total_steps, 250_000);
        assert_eq!(config.mintherm.steps_per_cycle, 5_000);
    }

    #[test]
    fn ligand_atoms_are_required() {
        let result = PrepConfig::builder().displacement([10.0, 10.0, 10.0]).build();
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingParameter("ligand1_atoms")
        );
    }

    #[test]
    fn zero_steps_per_cycle_is_rejected() {
        let result = minimal_builder()
            .mintherm(RunLength {
                total_steps: 1000,
                steps_per_cycle: 0,
            })
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "mintherm", .. })
        ));
    }

    #[test]
    fn solute_restraint_transform_covers_atoms_up_to_last_ligand_atom() {
        let config = minimal_builder().time_step_ps(0.004).build().unwrap();
        let restrained = config.with_solute_restraints();
        assert_eq!(restrained.time_step_ps, 0.001);
        assert_eq!(restrained.restraints.atoms, (0..=122).collect::<Vec<_>>());
    }

    #[test]
    fn solute_restraint_transform_leaves_base_config_untouched() {
        let config = minimal_builder().build().unwrap();
        let before = config.clone();
        let _ = config.with_solute_restraints();
        assert_eq!(config, before);
    }

    #[test]
    fn second_ligand_extends_the_restrained_range() {
        let config = minimal_builder()
            .ligand2_atoms(vec![123, 124, 125])
            .build()
            .unwrap();
        let restrained = config.with_solute_restraints();
        assert_eq!(restrained.restraints.atoms.len(), 126);
    }

    #[test]
    fn alignment_reference_atoms_flow_into_the_config() {
        let config = minimal_builder()
            .ligand2_atoms(vec![123, 124, 125])
            .ligand1_ref_atoms(vec![0, 1, 2])
            .ligand2_ref_atoms(vec![2, 1, 0])
            .build()
            .unwrap();
        assert_eq!(config.ligand1_ref_atoms, vec![0, 1, 2]);
        assert_eq!(config.ligand2_ref_atoms, vec![2, 1, 0]);
    }

    #[test]
    fn alignment_reference_atoms_require_a_second_ligand() {
        let result = minimal_builder()
            .ligand1_ref_atoms(vec![0, 1, 2])
            .ligand2_ref_atoms(vec![0, 1, 2])
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "ligand1_ref_atoms",
                ..
            })
        ));
    }

    #[test]
    fn one_sided_alignment_reference_is_rejected() {
        let result = minimal_builder()
            .ligand2_atoms(vec![123, 124, 125])
            .ligand1_ref_atoms(vec![0, 1, 2])
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn alignment_reference_needs_exactly_three_atoms_per_ligand() {
        let result = minimal_builder()
            .ligand2_atoms(vec![123, 124, 125])
            .ligand1_ref_atoms(vec![0, 1, 2])
            .ligand2_ref_atoms(vec![0, 1])
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "ligand2_ref_atoms",
                ..
            })
        ));
    }

    #[test]
    fn platform_names_round_trip() {
        for platform in [
            Platform::Cuda,
            Platform::OpenCl,
            Platform::Hip,
            Platform::Cpu,
            Platform::Reference,
        ] {
            assert_eq!(Platform::from_name(platform.engine_name()), Some(platform));
        }
        assert_eq!(Platform::from_name("Metal"), None);
    }

    #[test]
    fn gpu_platforms_use_mixed_precision() {
        assert!(Platform::Cuda.uses_mixed_precision());
        assert!(Platform::OpenCl.uses_mixed_precision());
        assert!(!Platform::Cpu.uses_mixed_precision());
    }
}
