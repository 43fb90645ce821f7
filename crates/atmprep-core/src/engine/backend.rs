//! The seam to the external molecular dynamics engine.
//!
//! Everything the staged protocol needs from the physics engine is expressed
//! by [`MdEngine`]: integration, minimization, a settable target temperature
//! and barostat interval, the alchemical-state parameters with a
//! perturbation-energy readback, and full-state snapshot/restore.
//! [`SystemFactory`] builds an engine for a phase from the job inputs and a
//! [`SystemSpec`] derived from the run configuration.

use super::config::{Platform, PrepConfig, RestraintConfig};
use super::error::EngineError;
use crate::core::models::alchemy::{AlchemicalState, SoftCoreParams};
use crate::core::models::job::JobDescriptor;
use crate::core::models::observables::Observables;
use crate::core::models::snapshot::Snapshot;
use crate::core::models::topology::Topology;

/// Barostat coupling interval that never triggers within any practical run;
/// setting it disables pressure coupling without removing the barostat.
pub const BAROSTAT_DISABLED_INTERVAL: u64 = 999_999_999;

/// Everything a [`SystemFactory`] needs to assemble a simulation system for
/// one phase. Derived from [`PrepConfig`] by pure transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSpec {
    /// Whether the perturbation (ATM) force is part of the system.
    pub alchemical: bool,
    pub temperature: f64,
    pub time_step_ps: f64,
    pub friction_per_ps: f64,
    pub nonbonded_cutoff_nm: f64,
    pub pressure_bar: f64,
    pub platform: Platform,
    pub ligand1_atoms: Vec<usize>,
    pub ligand2_atoms: Vec<usize>,
    /// Alignment reference atoms, relative to the first atom of each ligand.
    pub ligand1_ref_atoms: Vec<usize>,
    pub ligand2_ref_atoms: Vec<usize>,
    pub displacement: [f64; 3],
    pub restraints: RestraintConfig,
    pub receptor_cm_atoms: Vec<usize>,
    pub softcore: SoftCoreParams,
}

impl SystemSpec {
    fn from_config(config: &PrepConfig, alchemical: bool) -> Self {
        Self {
            alchemical,
            temperature: config.temperature,
            time_step_ps: config.time_step_ps,
            friction_per_ps: config.friction_per_ps,
            nonbonded_cutoff_nm: config.nonbonded_cutoff_nm,
            pressure_bar: config.pressure_bar,
            platform: config.platform,
            ligand1_atoms: config.ligand1_atoms.clone(),
            ligand2_atoms: config.ligand2_atoms.clone(),
            ligand1_ref_atoms: config.ligand1_ref_atoms.clone(),
            ligand2_ref_atoms: config.ligand2_ref_atoms.clone(),
            displacement: config.displacement,
            restraints: config.restraints.clone(),
            receptor_cm_atoms: config.receptor_cm_atoms.clone(),
            softcore: config.softcore,
        }
    }

    /// System without the perturbation force (minimization through NVT).
    pub fn physical(config: &PrepConfig) -> Self {
        Self::from_config(config, false)
    }

    /// System including the perturbation force (annealing onwards).
    pub fn alchemical(config: &PrepConfig) -> Self {
        Self::from_config(config, true)
    }
}

/// Adapter over one simulation context of the external engine.
///
/// The context is exclusively owned by the current phase; phases never share
/// an engine instance, they hand state over through snapshots.
pub trait MdEngine {
    /// Name of the compute platform the engine actually selected.
    fn platform_name(&self) -> String;

    /// Atom metadata for structure snapshots.
    fn topology(&self) -> &Topology;

    /// One-shot local energy minimization.
    fn minimize(&mut self) -> Result<(), EngineError>;

    /// Advances the simulation by `steps` integration steps.
    fn step(&mut self, steps: u64) -> Result<(), EngineError>;

    /// Sets the integrator's target temperature in kelvin.
    fn set_temperature(&mut self, kelvin: f64) -> Result<(), EngineError>;

    /// Sets the barostat coupling interval; [`BAROSTAT_DISABLED_INTERVAL`]
    /// disables pressure coupling.
    fn set_barostat_interval(&mut self, interval: u64) -> Result<(), EngineError>;

    /// Pushes the alchemical parameters into the perturbation force. Fails
    /// when the system was built without one.
    fn apply_alchemical_state(&mut self, state: &AlchemicalState) -> Result<(), EngineError>;

    /// Reads back the scalar observables of the current state.
    fn observables(&mut self) -> Result<Observables, EngineError>;

    /// Serializes the current simulation state.
    fn snapshot(&mut self) -> Result<Snapshot, EngineError>;

    /// Restores a previously serialized state into this context.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), EngineError>;
}

/// Builds a fresh engine context for one phase.
pub trait SystemFactory {
    type Engine: MdEngine;

    fn build(&self, job: &JobDescriptor, spec: &SystemSpec) -> Result<Self::Engine, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::PrepConfig;

    fn config() -> PrepConfig {
        PrepConfig::builder()
            .ligand1_atoms(vec![10, 11])
            .displacement([10.0, 10.0, 10.0])
            .build()
            .unwrap()
    }

    #[test]
    fn physical_spec_excludes_the_perturbation_force() {
        let spec = SystemSpec::physical(&config());
        assert!(!spec.alchemical);
    }

    #[test]
    fn alchemical_spec_includes_the_perturbation_force() {
        let spec = SystemSpec::alchemical(&config());
        assert!(spec.alchemical);
        assert_eq!(spec.displacement, [10.0, 10.0, 10.0]);
    }

    #[test]
    fn spec_carries_the_alignment_reference_atoms() {
        let config = PrepConfig::builder()
            .ligand1_atoms(vec![10, 11])
            .ligand2_atoms(vec![12, 13])
            .ligand1_ref_atoms(vec![0, 1, 2])
            .ligand2_ref_atoms(vec![2, 0, 1])
            .displacement([10.0, 10.0, 10.0])
            .build()
            .unwrap();
        let spec = SystemSpec::alchemical(&config);
        assert_eq!(spec.ligand1_ref_atoms, vec![0, 1, 2]);
        assert_eq!(spec.ligand2_ref_atoms, vec![2, 0, 1]);
    }

    #[test]
    fn disabled_interval_is_the_documented_sentinel() {
        assert_eq!(BAROSTAT_DISABLED_INTERVAL, 999_999_999);
    }
}
