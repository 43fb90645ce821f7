//! OpenMM implementation of the engine seam, reached through the Python API
//! (cargo feature `openmm`).
//!
//! The adapter owns the Python-side objects (`Simulation`, integrator,
//! barostat, `ATMMetaForce`) as GIL-independent handles and acquires the GIL
//! per call. System assembly follows the ATM preparation recipe: Amber
//! topology/coordinates, PME with a configurable cutoff, H-bond constraints,
//! Langevin dynamics (multiple-time-step variant when the perturbation force
//! is present), a Monte Carlo barostat, and the ATM meta-force with ligand
//! displacement plus center-of-mass and positional restraints.

use crate::core::models::alchemy::AlchemicalState;
use crate::core::models::job::JobDescriptor;
use crate::core::models::observables::Observables;
use crate::core::models::snapshot::Snapshot;
use crate::core::models::topology::{AtomRecord, Topology};
use crate::core::units;
use crate::engine::backend::{MdEngine, SystemFactory, SystemSpec};
use crate::engine::error::EngineError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

/// Force group of the nonbonded forces evaluated through the meta-force.
const NONBONDED_FORCE_GROUP: i32 = 1;
/// Force group of the ATM meta-force itself.
const ATM_FORCE_GROUP: i32 = 2;

/// Center-of-mass restraint force constant (kcal/mol/Å²) and sphere radius
/// (Å) tying each ligand to the binding-site Vsite.
const VSITE_FORCE_CONSTANT: f64 = 25.0;
const VSITE_RADIUS: f64 = 5.0;

/// Ligand-ligand alignment restraint of relative transfer setups:
/// displacement force constant (kcal/mol/Å²) and theta/psi angle force
/// constants (kcal/mol).
const ALIGNMENT_DISPL_FORCE_CONSTANT: f64 = 2.5;
const ALIGNMENT_ANGLE_FORCE_CONSTANT: f64 = 10.0;

const CONSTRAINT_TOLERANCE: f64 = 1.0e-5;

/// Builds [`OpenMmEngine`] contexts.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenMmFactory;

impl OpenMmFactory {
    pub fn new() -> Self {
        Self
    }
}

impl SystemFactory for OpenMmFactory {
    type Engine = OpenMmEngine;

    fn build(&self, job: &JobDescriptor, spec: &SystemSpec) -> Result<OpenMmEngine, EngineError> {
        OpenMmEngine::build(job, spec)
    }
}

/// Frequently used `openmm.unit` objects, held once per engine.
struct UnitHandles {
    angstrom: Py<PyAny>,
    picosecond: Py<PyAny>,
    kelvin: Py<PyAny>,
    kilojoule_per_mole: Py<PyAny>,
}

/// One OpenMM simulation context, exclusively owned by the current phase.
pub struct OpenMmEngine {
    simulation: Py<PyAny>,
    context: Py<PyAny>,
    integrator: Py<PyAny>,
    barostat: Py<PyAny>,
    atmforce: Option<Py<PyAny>>,
    units: UnitHandles,
    topology: Topology,
    platform_name: String,
    /// Multiple-time-step integrators expose temperature via the `kT` global.
    mts: bool,
    n_atoms: usize,
}

impl OpenMmEngine {
    fn build(job: &JobDescriptor, spec: &SystemSpec) -> Result<Self, EngineError> {
        Python::with_gil(|py| -> PyResult<Self> {
            let mm = PyModule::import_bound(py, "openmm")?;
            let app = PyModule::import_bound(py, "openmm.app")?;
            let unit = PyModule::import_bound(py, "openmm.unit")?;

            let angstrom = unit.getattr("angstrom")?;
            let picosecond = unit.getattr("picosecond")?;
            let kelvin = unit.getattr("kelvin")?;

            let prmtop = app
                .getattr("AmberPrmtopFile")?
                .call1((job.topology_path.to_string_lossy().into_owned(),))?;
            let inpcrd = app
                .getattr("AmberInpcrdFile")?
                .call1((job.coordinates_path.to_string_lossy().into_owned(),))?;

            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("nonbondedMethod", app.getattr("PME")?)?;
            kwargs.set_item(
                "nonbondedCutoff",
                unit.getattr("nanometer")?
                    .call_method1("__rmul__", (spec.nonbonded_cutoff_nm,))?,
            )?;
            kwargs.set_item("constraints", app.getattr("HBonds")?)?;
            let system = prmtop.call_method("createSystem", (), Some(&kwargs))?;

            let atm = PyModule::import_bound(py, "atmmetaforce")?;
            let atm_utils = atm.getattr("ATMMetaForceUtils")?.call1((system.clone(),))?;

            let offset_zero = angstrom.call_method1("__rmul__", ((0.0, 0.0, 0.0),))?;
            let displacement = spec.displacement;
            let offset_displ = angstrom.call_method1(
                "__rmul__",
                ((displacement[0], displacement[1], displacement[2]),),
            )?;

            // Vsite CM-CM restraints keep each ligand near its end-state site.
            if !spec.receptor_cm_atoms.is_empty() {
                let ang_squared = angstrom.call_method1("__pow__", (2,))?;
                let kf = unit
                    .getattr("kilocalorie_per_mole")?
                    .call_method1("__truediv__", (ang_squared,))?
                    .call_method1("__rmul__", (VSITE_FORCE_CONSTANT,))?;
                let r0 = angstrom.call_method1("__rmul__", (VSITE_RADIUS,))?;

                let restraint = PyDict::new_bound(py);
                restraint.set_item("lig_cm_particles", spec.ligand1_atoms.clone())?;
                restraint.set_item("rcpt_cm_particles", spec.receptor_cm_atoms.clone())?;
                restraint.set_item("kfcm", kf.clone())?;
                restraint.set_item("tolcm", r0.clone())?;
                restraint.set_item("offset", offset_zero.clone())?;
                atm_utils.call_method("addRestraintForce", (), Some(&restraint))?;

                if !spec.ligand2_atoms.is_empty() {
                    let restraint = PyDict::new_bound(py);
                    restraint.set_item("lig_cm_particles", spec.ligand2_atoms.clone())?;
                    restraint.set_item("rcpt_cm_particles", spec.receptor_cm_atoms.clone())?;
                    restraint.set_item("kfcm", kf)?;
                    restraint.set_item("tolcm", r0)?;
                    restraint.set_item("offset", offset_displ.clone())?;
                    atm_utils.call_method("addRestraintForce", (), Some(&restraint))?;
                }
            }

            // Alignment restraint superimposing ligand 2 onto ligand 1 across
            // the displacement, anchored on three reference atoms per ligand.
            if !spec.ligand2_atoms.is_empty() && !spec.ligand1_ref_atoms.is_empty() {
                let lig1_start = spec.ligand1_atoms[0];
                let lig2_start = spec.ligand2_atoms[0];
                let lig1_ref: Vec<usize> = spec
                    .ligand1_ref_atoms
                    .iter()
                    .map(|&i| i + lig1_start)
                    .collect();
                let lig2_ref: Vec<usize> = spec
                    .ligand2_ref_atoms
                    .iter()
                    .map(|&i| i + lig2_start)
                    .collect();

                let ang_squared = angstrom.call_method1("__pow__", (2,))?;
                let kcal = unit.getattr("kilocalorie_per_mole")?;
                let kfdispl = kcal
                    .call_method1("__truediv__", (ang_squared,))?
                    .call_method1("__rmul__", (ALIGNMENT_DISPL_FORCE_CONSTANT,))?;
                let kangle =
                    kcal.call_method1("__rmul__", (ALIGNMENT_ANGLE_FORCE_CONSTANT,))?;

                let alignment = PyDict::new_bound(py);
                alignment.set_item("liga_ref_particles", lig1_ref)?;
                alignment.set_item("ligb_ref_particles", lig2_ref)?;
                alignment.set_item("kfdispl", kfdispl)?;
                alignment.set_item("ktheta", kangle.clone())?;
                alignment.set_item("kpsi", kangle)?;
                alignment.set_item("offset", offset_displ.clone())?;
                atm_utils.call_method("addAlignmentForce", (), Some(&alignment))?;
            }

            // Flat-bottom positional restraints on the configured atoms.
            if !spec.restraints.atoms.is_empty() {
                let ang_squared = angstrom.call_method1("__pow__", (2,))?;
                let fc = unit
                    .getattr("kilocalorie_per_mole")?
                    .call_method1("__truediv__", (ang_squared,))?
                    .call_method1("__rmul__", (spec.restraints.force_constant,))?;
                let tol = angstrom.call_method1("__rmul__", (spec.restraints.tolerance,))?;
                atm_utils.call_method1(
                    "addPosRestraints",
                    (
                        spec.restraints.atoms.clone(),
                        inpcrd.getattr("positions")?,
                        fc,
                        tol,
                    ),
                )?;
            }

            let mut atmforce = None;
            if spec.alchemical {
                atm_utils.call_method1("setNonbondedForceGroup", (NONBONDED_FORCE_GROUP,))?;

                let initial = AlchemicalState::decoupled(&spec.softcore);
                let force = atm.getattr("ATMMetaForce")?.call1((
                    initial.lambda1,
                    initial.lambda2,
                    initial.alpha / units::KJ_PER_KCAL,
                    units::kcal_to_kj(initial.u0),
                    units::kcal_to_kj(initial.w0coeff),
                    units::kcal_to_kj(initial.umax),
                    units::kcal_to_kj(initial.ubcore),
                    initial.acore,
                    initial.direction,
                    vec![NONBONDED_FORCE_GROUP],
                ))?;

                // All atoms participate; only ligand atoms get displaced,
                // ligand 1 out of the site and ligand 2 into it.
                let n_particles: usize = system.call_method0("getNumParticles")?.extract()?;
                for i in 0..n_particles {
                    force.call_method1("addParticle", (i, 0.0, 0.0, 0.0))?;
                }
                let forward = [
                    angstrom.call_method1("__rmul__", (displacement[0],))?,
                    angstrom.call_method1("__rmul__", (displacement[1],))?,
                    angstrom.call_method1("__rmul__", (displacement[2],))?,
                ];
                let reverse = [
                    angstrom.call_method1("__rmul__", (-displacement[0],))?,
                    angstrom.call_method1("__rmul__", (-displacement[1],))?,
                    angstrom.call_method1("__rmul__", (-displacement[2],))?,
                ];
                for &i in &spec.ligand1_atoms {
                    force.call_method1(
                        "setParticleParameters",
                        (
                            i,
                            i,
                            forward[0].clone(),
                            forward[1].clone(),
                            forward[2].clone(),
                        ),
                    )?;
                }
                for &i in &spec.ligand2_atoms {
                    force.call_method1(
                        "setParticleParameters",
                        (
                            i,
                            i,
                            reverse[0].clone(),
                            reverse[1].clone(),
                            reverse[2].clone(),
                        ),
                    )?;
                }
                force.call_method1("setForceGroup", (ATM_FORCE_GROUP,))?;
                system.call_method1("addForce", (force.clone(),))?;
                atmforce = Some(force.unbind());
            }

            let pressure = unit
                .getattr("bar")?
                .call_method1("__rmul__", (spec.pressure_bar,))?;
            let temperature = kelvin.call_method1("__rmul__", (spec.temperature,))?;
            let barostat = mm
                .getattr("MonteCarloBarostat")?
                .call1((pressure, temperature.clone()))?;
            system.call_method1("addForce", (barostat.clone(),))?;

            let friction = picosecond.call_method1("__rtruediv__", (spec.friction_per_ps,))?;
            let time_step = picosecond.call_method1("__rmul__", (spec.time_step_ps,))?;
            let (integrator, mts) = if spec.alchemical {
                let groups = vec![(0, 1), (ATM_FORCE_GROUP, 1)];
                (
                    mm.getattr("MTSLangevinIntegrator")?.call1((
                        temperature.clone(),
                        friction,
                        time_step,
                        groups,
                    ))?,
                    true,
                )
            } else {
                (
                    mm.getattr("LangevinMiddleIntegrator")?.call1((
                        temperature.clone(),
                        friction,
                        time_step,
                    ))?,
                    false,
                )
            };
            integrator.call_method1("setConstraintTolerance", (CONSTRAINT_TOLERANCE,))?;

            let platform = mm
                .getattr("Platform")?
                .call_method1("getPlatformByName", (spec.platform.engine_name(),))?;
            let properties = PyDict::new_bound(py);
            if spec.platform.uses_mixed_precision() {
                properties.set_item("Precision", "mixed")?;
            }

            let simulation = app.getattr("Simulation")?.call1((
                prmtop.getattr("topology")?,
                system.clone(),
                integrator.clone(),
                platform,
                properties,
            ))?;
            let context = simulation.getattr("context")?;
            context.call_method1("setPositions", (inpcrd.getattr("positions")?,))?;
            let box_vectors = inpcrd.getattr("boxVectors")?;
            if !box_vectors.is_none() {
                context.call_method1(
                    "setPeriodicBoxVectors",
                    (
                        box_vectors.get_item(0)?,
                        box_vectors.get_item(1)?,
                        box_vectors.get_item(2)?,
                    ),
                )?;
            }

            let platform_name: String = context
                .call_method0("getPlatform")?
                .call_method0("getName")?
                .extract()?;
            let topology = read_topology(&prmtop.getattr("topology")?)?;
            let n_atoms: usize = system.call_method0("getNumParticles")?.extract()?;

            Ok(Self {
                simulation: simulation.unbind(),
                context: context.unbind(),
                integrator: integrator.unbind(),
                barostat: barostat.unbind(),
                atmforce,
                units: UnitHandles {
                    angstrom: angstrom.unbind(),
                    picosecond: picosecond.unbind(),
                    kelvin: kelvin.unbind(),
                    kilojoule_per_mole: unit.getattr("kilojoule_per_mole")?.unbind(),
                },
                topology,
                platform_name,
                mts,
                n_atoms,
            })
        })
        .map_err(EngineError::from)
    }
}

fn read_topology(topology: &Bound<'_, PyAny>) -> PyResult<Topology> {
    let mut atoms = Vec::new();
    for atom in topology.call_method0("atoms")?.iter()? {
        let atom = atom?;
        let residue = atom.getattr("residue")?;
        let chain: String = residue.getattr("chain")?.getattr("id")?.extract()?;
        let element = atom.getattr("element")?;
        let element = if element.is_none() {
            String::new()
        } else {
            element.getattr("symbol")?.extract()?
        };
        atoms.push(AtomRecord {
            name: atom.getattr("name")?.extract()?,
            residue_name: residue.getattr("name")?.extract()?,
            residue_seq: residue.getattr("index")?.extract::<i64>()? as i32 + 1,
            chain_id: chain.chars().next().unwrap_or('A'),
            element,
        });
    }
    Ok(Topology { atoms })
}

impl MdEngine for OpenMmEngine {
    fn platform_name(&self) -> String {
        self.platform_name.clone()
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn minimize(&mut self) -> Result<(), EngineError> {
        Python::with_gil(|py| -> PyResult<()> {
            self.simulation.bind(py).call_method0("minimizeEnergy")?;
            Ok(())
        })?;
        Ok(())
    }

    fn step(&mut self, steps: u64) -> Result<(), EngineError> {
        Python::with_gil(|py| -> PyResult<()> {
            self.simulation.bind(py).call_method1("step", (steps,))?;
            Ok(())
        })?;
        Ok(())
    }

    fn set_temperature(&mut self, kelvin: f64) -> Result<(), EngineError> {
        Python::with_gil(|py| -> PyResult<()> {
            let integrator = self.integrator.bind(py);
            if self.mts {
                // The multiple-time-step Langevin integrator has no
                // setTemperature; its thermal energy lives in the kT global.
                let kt = units::MOLAR_GAS_CONSTANT_KJ * kelvin;
                integrator.call_method1("setGlobalVariableByName", ("kT", kt))?;
            } else {
                let temperature = self
                    .units
                    .kelvin
                    .bind(py)
                    .call_method1("__rmul__", (kelvin,))?;
                integrator.call_method1("setTemperature", (temperature,))?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn set_barostat_interval(&mut self, interval: u64) -> Result<(), EngineError> {
        Python::with_gil(|py| -> PyResult<()> {
            self.barostat
                .bind(py)
                .call_method1("setFrequency", (interval,))?;
            Ok(())
        })?;
        Ok(())
    }

    fn apply_alchemical_state(&mut self, state: &AlchemicalState) -> Result<(), EngineError> {
        let Some(atmforce) = &self.atmforce else {
            return Err(EngineError::Backend(
                "this system was built without the perturbation force".to_string(),
            ));
        };
        Python::with_gil(|py| -> PyResult<()> {
            let force = atmforce.bind(py);
            let context = self.context.bind(py);
            let set = |parameter: &str, value: f64| -> PyResult<()> {
                let name = force.call_method0(parameter)?;
                context.call_method1("setParameter", (name, value))?;
                Ok(())
            };
            set("Lambda1", state.lambda1)?;
            set("Lambda2", state.lambda2)?;
            set("Alpha", state.alpha / units::KJ_PER_KCAL)?;
            set("U0", units::kcal_to_kj(state.u0))?;
            set("W0", units::kcal_to_kj(state.w0coeff))?;
            set("Umax", units::kcal_to_kj(state.umax))?;
            set("Ubcore", units::kcal_to_kj(state.ubcore))?;
            set("Acore", state.acore)?;
            set("Direction", state.direction as f64)?;
            Ok(())
        })?;
        Ok(())
    }

    fn observables(&mut self) -> Result<Observables, EngineError> {
        let observables = Python::with_gil(|py| -> PyResult<Observables> {
            let context = self.context.bind(py);
            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("getEnergy", true)?;
            if self.atmforce.is_some() {
                kwargs.set_item("groups", vec![0, ATM_FORCE_GROUP])?;
            }
            let state = context.call_method("getState", (), Some(&kwargs))?;

            // The engine reports energies in kJ/mol; this layer records them
            // in kcal/mol.
            let kj = self.units.kilojoule_per_mole.bind(py);

            let potential_kj: f64 = state
                .call_method0("getPotentialEnergy")?
                .call_method1("value_in_unit", (kj.clone(),))?
                .extract()?;
            let potential_energy = units::kj_to_kcal(potential_kj);
            let perturbation_energy = match &self.atmforce {
                Some(force) => {
                    let perturbation_kj: f64 = force
                        .bind(py)
                        .call_method1("getPerturbationEnergy", (context.clone(),))?
                        .call_method1("value_in_unit", (kj.clone(),))?
                        .extract()?;
                    units::kj_to_kcal(perturbation_kj)
                }
                None => 0.0,
            };

            // Instantaneous temperature from the kinetic energy with 3N
            // degrees of freedom; constrained degrees are not subtracted.
            let kinetic_energy: f64 = state
                .call_method0("getKineticEnergy")?
                .call_method1("value_in_unit", (kj.clone(),))?
                .extract()?;
            let temperature = 2.0 * kinetic_energy
                / (3.0 * self.n_atoms as f64 * units::MOLAR_GAS_CONSTANT_KJ);

            let angstrom_cubed = self
                .units
                .angstrom
                .bind(py)
                .call_method1("__pow__", (3,))?;
            let volume: f64 = state
                .call_method0("getPeriodicBoxVolume")?
                .call_method1("value_in_unit", (angstrom_cubed,))?
                .extract()?;

            Ok(Observables {
                potential_energy,
                perturbation_energy,
                temperature,
                volume,
            })
        })?;
        Ok(observables)
    }

    fn snapshot(&mut self) -> Result<Snapshot, EngineError> {
        let snapshot = Python::with_gil(|py| -> PyResult<Snapshot> {
            let context = self.context.bind(py);
            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("getPositions", true)?;
            kwargs.set_item("getVelocities", true)?;
            let state = context.call_method("getState", (), Some(&kwargs))?;

            let angstrom = self.units.angstrom.bind(py);
            let angstrom_per_ps =
                angstrom.call_method1("__truediv__", (self.units.picosecond.bind(py).clone(),))?;

            let positions: Vec<(f64, f64, f64)> = state
                .call_method0("getPositions")?
                .call_method1("value_in_unit", (angstrom.clone(),))?
                .extract()?;
            let velocities: Vec<(f64, f64, f64)> = state
                .call_method0("getVelocities")?
                .call_method1("value_in_unit", (angstrom_per_ps,))?
                .extract()?;
            let box_vectors: Vec<(f64, f64, f64)> = state
                .call_method0("getPeriodicBoxVectors")?
                .call_method1("value_in_unit", (angstrom.clone(),))?
                .extract()?;

            let as_array = |v: &(f64, f64, f64)| [v.0, v.1, v.2];
            Ok(Snapshot {
                positions: positions.iter().map(as_array).collect(),
                velocities: velocities.iter().map(as_array).collect(),
                box_vectors: [
                    as_array(&box_vectors[0]),
                    as_array(&box_vectors[1]),
                    as_array(&box_vectors[2]),
                ],
            })
        })?;
        Ok(snapshot)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), EngineError> {
        Python::with_gil(|py| -> PyResult<()> {
            let context = self.context.bind(py);
            let angstrom = self.units.angstrom.bind(py);
            let angstrom_per_ps =
                angstrom.call_method1("__truediv__", (self.units.picosecond.bind(py).clone(),))?;

            let positions = PyList::new_bound(
                py,
                snapshot.positions.iter().map(|p| (p[0], p[1], p[2])),
            );
            context.call_method1(
                "setPositions",
                (angstrom.call_method1("__rmul__", (positions,))?,),
            )?;

            let velocities = PyList::new_bound(
                py,
                snapshot.velocities.iter().map(|v| (v[0], v[1], v[2])),
            );
            context.call_method1(
                "setVelocities",
                (angstrom_per_ps.call_method1("__rmul__", (velocities,))?,),
            )?;

            let [a, b, c] = snapshot.box_vectors;
            context.call_method1(
                "setPeriodicBoxVectors",
                (
                    angstrom.call_method1("__rmul__", ((a[0], a[1], a[2]),))?,
                    angstrom.call_method1("__rmul__", ((b[0], b[1], b[2]),))?,
                    angstrom.call_method1("__rmul__", ((c[0], c[1], c[2]),))?,
                ),
            )?;
            Ok(())
        })?;
        Ok(())
    }
}
