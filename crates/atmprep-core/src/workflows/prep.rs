//! The staged preparation workflow.
//!
//! Runs the fixed phase sequence minimize → thermalize → NPT → NVT →
//! alchemical annealing → lambda equilibration. Every phase builds a fresh
//! engine context (from the raw inputs for the first phase, from the
//! predecessor's checkpoint otherwise), runs its protocol, and persists a
//! checkpoint plus structure snapshot under `"{basename}_{tag}"`. A failed
//! or interrupted run can therefore be resumed from the first phase whose
//! checkpoint is missing.

use crate::core::io::checkpoint::CheckpointStore;
use crate::core::models::job::JobDescriptor;
use crate::engine::backend::{MdEngine, SystemFactory, SystemSpec};
use crate::engine::config::PrepConfig;
use crate::engine::context::PrepContext;
use crate::engine::error::EngineError;
use crate::engine::phases::{
    Phase, lambda_annealing, lambda_equilibration, minimize, npt_equilibration,
    nvt_equilibration, thermalize,
};
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Artifacts persisted at the end of one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutput {
    pub phase: Phase,
    pub checkpoint: PathBuf,
    pub structure: PathBuf,
}

/// Summary of a completed preparation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepReport {
    pub phases: Vec<PhaseOutput>,
}

/// Runs the complete protocol from the first phase.
pub fn run<F: SystemFactory>(
    job: &JobDescriptor,
    config: &PrepConfig,
    factory: &F,
    store: &CheckpointStore,
    reporter: &ProgressReporter,
) -> Result<PrepReport, EngineError> {
    run_from(Phase::Minimize, job, config, factory, store, reporter)
}

/// Runs the protocol starting at `start`, consuming the checkpoint of the
/// predecessor phase. Starting anywhere but the first phase requires that
/// checkpoint to exist; a missing or unreadable one is fatal.
#[instrument(skip_all, name = "prep_workflow", fields(job = %job.basename))]
pub fn run_from<F: SystemFactory>(
    start: Phase,
    job: &JobDescriptor,
    config: &PrepConfig,
    factory: &F,
    store: &CheckpointStore,
    reporter: &ProgressReporter,
) -> Result<PrepReport, EngineError> {
    // Phases up to and including annealing run with all solutes restrained
    // so only the solvent relaxes; the final equilibration runs with the
    // operator-supplied restraint configuration.
    let restrained_config = config.with_solute_restraints();

    let mut outputs = Vec::new();
    let start_index = Phase::ALL
        .iter()
        .position(|&p| p == start)
        .unwrap_or_default();

    for &phase in &Phase::ALL[start_index..] {
        let phase_config = if phase.uses_solute_restraints() {
            &restrained_config
        } else {
            config
        };
        let ctx = PrepContext {
            job,
            config: phase_config,
            store,
            reporter,
        };

        reporter.report(Progress::PhaseStart { name: phase.name() });
        info!(phase = phase.name(), tag = phase.tag(), "Starting phase.");

        let spec = if phase.is_alchemical() {
            SystemSpec::alchemical(phase_config)
        } else {
            SystemSpec::physical(phase_config)
        };
        let mut engine = factory.build(job, &spec)?;
        info!(platform = %engine.platform_name(), "Using platform.");

        if let Some(previous) = phase.predecessor() {
            let snapshot = store
                .load(&job.basename, previous.tag())
                .map_err(|source| EngineError::Checkpoint {
                    tag: previous.tag(),
                    source,
                })?;
            engine.restore(&snapshot)?;
        }

        match phase {
            Phase::Minimize => minimize::run(&ctx, &mut engine)?,
            Phase::Thermalize => thermalize::run(&ctx, &mut engine)?,
            Phase::NptEquilibration => npt_equilibration::run(&ctx, &mut engine)?,
            Phase::NvtEquilibration => nvt_equilibration::run(&ctx, &mut engine)?,
            Phase::LambdaAnnealing => lambda_annealing::run(&ctx, &mut engine)?,
            Phase::LambdaEquilibration => lambda_equilibration::run(&ctx, &mut engine)?,
        }

        let snapshot = engine.snapshot()?;
        let checkpoint = store.save(&job.basename, phase.tag(), &snapshot)?;
        let structure =
            store.save_structure(&job.basename, phase.tag(), engine.topology(), &snapshot)?;
        info!(
            checkpoint = %checkpoint.display(),
            "Phase complete; state persisted."
        );
        reporter.report(Progress::PhaseFinish);

        outputs.push(PhaseOutput {
            phase,
            checkpoint,
            structure,
        });
    }

    info!(phases = outputs.len(), "Preparation protocol complete.");
    Ok(PrepReport { phases: outputs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::alchemy::AlchemicalState;
    use crate::core::models::observables::Observables;
    use crate::core::models::snapshot::Snapshot;
    use crate::core::models::topology::{AtomRecord, Topology};
    use crate::engine::backend::{BAROSTAT_DISABLED_INTERVAL, MdEngine, SystemSpec};
    use crate::engine::config::RunLength;
    use crate::engine::error::EngineError;
    use crate::engine::progress::Progress;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Build {
            alchemical: bool,
            time_step_ps: f64,
            restrained_atoms: usize,
        },
        Restore(f64),
        Minimize,
        Step(u64),
        SetTemperature(f64),
        SetBarostat(u64),
        ApplyLambda(f64),
    }

    type EventLog = Arc<Mutex<Vec<Event>>>;

    /// Scripted engine: `position` advances by one unit per integration step,
    /// so checkpoints written after different phases are distinguishable and
    /// restore order can be asserted exactly.
    struct MockEngine {
        events: EventLog,
        topology: Topology,
        position: f64,
    }

    impl MdEngine for MockEngine {
        fn platform_name(&self) -> String {
            "Mock".to_string()
        }

        fn topology(&self) -> &Topology {
            &self.topology
        }

        fn minimize(&mut self) -> Result<(), EngineError> {
            self.events.lock().unwrap().push(Event::Minimize);
            Ok(())
        }

        fn step(&mut self, steps: u64) -> Result<(), EngineError> {
            self.position += steps as f64;
            self.events.lock().unwrap().push(Event::Step(steps));
            Ok(())
        }

        fn set_temperature(&mut self, kelvin: f64) -> Result<(), EngineError> {
            self.events
                .lock()
                .unwrap()
                .push(Event::SetTemperature(kelvin));
            Ok(())
        }

        fn set_barostat_interval(&mut self, interval: u64) -> Result<(), EngineError> {
            self.events
                .lock()
                .unwrap()
                .push(Event::SetBarostat(interval));
            Ok(())
        }

        fn apply_alchemical_state(
            &mut self,
            state: &AlchemicalState,
        ) -> Result<(), EngineError> {
            self.events
                .lock()
                .unwrap()
                .push(Event::ApplyLambda(state.lambda()));
            Ok(())
        }

        fn observables(&mut self) -> Result<Observables, EngineError> {
            Ok(Observables {
                potential_energy: -55_000.0 + self.position * 1.0e-3,
                perturbation_energy: 12.5,
                temperature: 298.7,
                volume: 27_000.0,
            })
        }

        fn snapshot(&mut self) -> Result<Snapshot, EngineError> {
            Ok(Snapshot {
                positions: vec![[self.position, 0.0, 0.0]],
                velocities: vec![[0.0, 0.0, 0.0]],
                box_vectors: [[30.0, 0.0, 0.0], [0.0, 30.0, 0.0], [0.0, 0.0, 30.0]],
            })
        }

        fn restore(&mut self, snapshot: &Snapshot) -> Result<(), EngineError> {
            self.position = snapshot.positions[0][0];
            self.events
                .lock()
                .unwrap()
                .push(Event::Restore(self.position));
            Ok(())
        }
    }

    struct MockFactory {
        events: EventLog,
    }

    impl MockFactory {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl SystemFactory for MockFactory {
        type Engine = MockEngine;

        fn build(
            &self,
            _job: &JobDescriptor,
            spec: &SystemSpec,
        ) -> Result<MockEngine, EngineError> {
            self.events.lock().unwrap().push(Event::Build {
                alchemical: spec.alchemical,
                time_step_ps: spec.time_step_ps,
                restrained_atoms: spec.restraints.atoms.len(),
            });
            Ok(MockEngine {
                events: Arc::clone(&self.events),
                topology: Topology {
                    atoms: vec![AtomRecord {
                        name: "CA".to_string(),
                        residue_name: "ALA".to_string(),
                        residue_seq: 1,
                        chain_id: 'A',
                        element: "C".to_string(),
                    }],
                },
                position: 0.0,
            })
        }
    }

    fn test_config() -> PrepConfig {
        PrepConfig::builder()
            .ligand1_atoms(vec![3, 4])
            .ligand2_atoms(vec![5, 6])
            .displacement([10.0, 10.0, 10.0])
            .time_step_ps(0.004)
            .mintherm(RunLength {
                total_steps: 50_000,
                steps_per_cycle: 5_000,
            })
            .annealing(RunLength {
                total_steps: 50_000,
                steps_per_cycle: 5_000,
            })
            .equilibration(RunLength {
                total_steps: 25_000,
                steps_per_cycle: 5_000,
            })
            .build()
            .unwrap()
    }

    fn run_protocol(dir: &Path) -> (Vec<Event>, PrepReport) {
        let job = JobDescriptor::from_basename("complex");
        let config = test_config();
        let factory = MockFactory::new();
        let store = CheckpointStore::new(dir);
        let report = run(&job, &config, &factory, &store, &ProgressReporter::new()).unwrap();
        let events = factory.events.lock().unwrap().clone();
        (events, report)
    }

    fn events_of<F: Fn(&Event) -> bool>(events: &[Event], keep: F) -> Vec<Event> {
        events.iter().filter(|e| keep(e)).cloned().collect()
    }

    #[test]
    fn phases_run_in_order_and_persist_their_state() {
        let dir = tempdir().unwrap();
        let (events, report) = run_protocol(dir.path());

        let tags: Vec<_> = report.phases.iter().map(|p| p.phase.tag()).collect();
        assert_eq!(tags, ["min", "therm", "npt", "equil", "mdlambda", "0"]);

        for output in &report.phases {
            assert!(output.checkpoint.exists(), "{:?}", output.checkpoint);
            assert!(output.structure.exists(), "{:?}", output.structure);
        }

        assert_eq!(events_of(&events, |e| *e == Event::Minimize).len(), 1);
        // 10 cycles each for therm/npt/nvt/anneal, 5 for the equilibration.
        assert_eq!(
            events_of(&events, |e| matches!(e, Event::Step(_))).len(),
            45
        );

        let therm_log = std::fs::read_to_string(dir.path().join("complex_therm.out")).unwrap();
        let rows: Vec<_> = therm_log.lines().collect();
        assert_eq!(rows.len(), 10);
        for row in rows {
            assert_eq!(row.split(' ').count(), 9);
        }
        assert!(dir.path().join("complex_mdlambda_traj.pdb").exists());
        assert!(dir.path().join("complex_0_traj.pdb").exists());
    }

    #[test]
    fn barostat_follows_the_pressure_schedule() {
        let dir = tempdir().unwrap();
        let (events, _) = run_protocol(dir.path());

        let intervals: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::SetBarostat(interval) => Some(*interval),
                _ => None,
            })
            .collect();
        // Pressure coupling only during the NPT phase.
        assert_eq!(
            intervals,
            [
                BAROSTAT_DISABLED_INTERVAL,
                25,
                BAROSTAT_DISABLED_INTERVAL,
                BAROSTAT_DISABLED_INTERVAL,
                BAROSTAT_DISABLED_INTERVAL,
            ]
        );
    }

    #[test]
    fn annealing_sweeps_the_coupling_to_the_midpoint() {
        let dir = tempdir().unwrap();
        let (events, _) = run_protocol(dir.path());

        let lambdas: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::ApplyLambda(lambda) => Some(*lambda),
                _ => None,
            })
            .collect();

        // 11 ramp points during annealing, then one application of the held
        // midpoint by the equilibration phase.
        assert_eq!(lambdas.len(), 12);
        assert_eq!(lambdas[0], 0.0);
        assert_eq!(lambdas[10], 0.5);
        assert_eq!(lambdas[11], 0.5);
        assert!(lambdas.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn phases_chain_through_checkpoints() {
        let dir = tempdir().unwrap();
        let (events, _) = run_protocol(dir.path());

        let restores: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Restore(position) => Some(*position),
                _ => None,
            })
            .collect();
        // Each phase resumes exactly where its predecessor stopped.
        assert_eq!(
            restores,
            [0.0, 50_000.0, 100_000.0, 150_000.0, 200_000.0]
        );
    }

    #[test]
    fn thermalization_ramps_from_initial_to_target() {
        let dir = tempdir().unwrap();
        let (events, _) = run_protocol(dir.path());

        let temperatures: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::SetTemperature(kelvin) => Some(*kelvin),
                _ => None,
            })
            .collect();

        assert_eq!(temperatures[0], 50.0);
        // 50 K start plus ten 25 K increments lands on the 300 K target.
        assert_eq!(temperatures[10], 300.0);
        assert!(temperatures.iter().all(|&t| (50.0..=300.0).contains(&t)));
    }

    #[test]
    fn solute_restraints_lift_for_the_final_phase() {
        let dir = tempdir().unwrap();
        let (events, _) = run_protocol(dir.path());

        let builds: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Build {
                    alchemical,
                    time_step_ps,
                    restrained_atoms,
                } => Some((*alchemical, *time_step_ps, *restrained_atoms)),
                _ => None,
            })
            .collect();

        assert_eq!(builds.len(), 6);
        // Atoms 0..=6 (through the last ligand-2 atom) restrained and a 1 fs
        // step until the final phase, which runs with the operator-supplied
        // configuration.
        for build in &builds[..5] {
            assert_eq!(build.1, 0.001);
            assert_eq!(build.2, 7);
        }
        assert_eq!(builds[5], (true, 0.004, 0));

        let alchemical: Vec<_> = builds.iter().map(|b| b.0).collect();
        assert_eq!(alchemical, [false, false, false, false, true, true]);
    }

    #[test]
    fn resuming_without_predecessor_checkpoint_fails() {
        let dir = tempdir().unwrap();
        let job = JobDescriptor::from_basename("complex");
        let factory = MockFactory::new();
        let store = CheckpointStore::new(dir.path());

        let result = run_from(
            Phase::LambdaAnnealing,
            &job,
            &test_config(),
            &factory,
            &store,
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::Checkpoint { tag: "equil", .. })
        ));
    }

    #[test]
    fn resuming_runs_only_the_remaining_phases() {
        let dir = tempdir().unwrap();
        let (_, _) = run_protocol(dir.path());

        let job = JobDescriptor::from_basename("complex");
        let factory = MockFactory::new();
        let store = CheckpointStore::new(dir.path());
        let report = run_from(
            Phase::LambdaEquilibration,
            &job,
            &test_config(),
            &factory,
            &store,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.phases.len(), 1);
        assert_eq!(report.phases[0].phase, Phase::LambdaEquilibration);
        let events = factory.events.lock().unwrap();
        assert_eq!(
            events_of(&events, |e| matches!(e, Event::Build { .. })).len(),
            1
        );
        // Resumes from the annealed state.
        assert!(events.contains(&Event::Restore(200_000.0)));
    }

    #[test]
    fn base_configuration_is_never_mutated() {
        let dir = tempdir().unwrap();
        let job = JobDescriptor::from_basename("complex");
        let config = test_config();
        let before = config.clone();
        let factory = MockFactory::new();
        let store = CheckpointStore::new(dir.path());

        run(&job, &config, &factory, &store, &ProgressReporter::new()).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn cycle_events_reach_the_progress_reporter() {
        let dir = tempdir().unwrap();
        let job = JobDescriptor::from_basename("complex");
        let factory = MockFactory::new();
        let store = CheckpointStore::new(dir.path());

        let volumes = Mutex::new(Vec::new());
        let phase_starts = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::CycleFinish { observables, .. } => {
                volumes.lock().unwrap().push(observables.volume)
            }
            Progress::PhaseStart { name } => phase_starts.lock().unwrap().push(name),
            _ => {}
        }));

        run(&job, &test_config(), &factory, &store, &reporter).unwrap();
        // Every cycle surfaces the engine readback, box volume included.
        let volumes = volumes.lock().unwrap();
        assert_eq!(volumes.len(), 45);
        assert!(volumes.iter().all(|&v| v == 27_000.0));
        assert_eq!(phase_starts.lock().unwrap().len(), 6);
    }
}
