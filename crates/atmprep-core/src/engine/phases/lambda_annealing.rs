use crate::core::io::cyclelog::CycleLog;
use crate::core::io::pdb::TrajectoryWriter;
use crate::core::models::alchemy::AlchemicalState;
use crate::core::models::observables::CycleRecord;
use crate::core::schedule::LambdaSchedule;
use crate::engine::backend::{BAROSTAT_DISABLED_INTERVAL, MdEngine};
use crate::engine::context::PrepContext;
use crate::engine::error::EngineError;
use crate::engine::phases::Phase;
use crate::engine::progress::Progress;
use tracing::info;

/// Coupling interval of the annealing ramp: from the decoupled end state to
/// the alchemical midpoint.
pub const LAMBDA_START: f64 = 0.0;
pub const LAMBDA_END: f64 = 0.5;

/// Anneals the coupling parameters from 0 to 1/2, one linear step per cycle.
/// The perturbation energy is read back and logged every cycle, and a
/// trajectory frame is sampled per cycle.
pub(crate) fn run<E: MdEngine>(ctx: &PrepContext, engine: &mut E) -> Result<(), EngineError> {
    let plan = ctx.config.annealing.plan();
    let schedule = LambdaSchedule::new(LAMBDA_START, LAMBDA_END, plan.cycles);
    info!(
        cycles = plan.cycles,
        delta_lambda = schedule.step(),
        "Annealing to lambda = 1/2 ..."
    );

    engine.set_temperature(ctx.config.temperature)?;
    engine.set_barostat_interval(BAROSTAT_DISABLED_INTERVAL)?;

    let mut state = AlchemicalState::at_lambda(schedule.value(0), &ctx.config.softcore);
    engine.apply_alchemical_state(&state)?;

    let tag = Phase::LambdaAnnealing.tag();
    let mut log = CycleLog::create(&ctx.log_path(tag))?;
    let mut trajectory = TrajectoryWriter::create(&ctx.trajectory_path(tag))?;

    for cycle in 0..plan.cycles {
        engine.step(plan.steps_per_cycle)?;
        let observables = engine.observables()?;
        log.append(&CycleRecord::new(ctx.config.temperature, &state, &observables))?;
        let snapshot = engine.snapshot()?;
        trajectory.append_frame(engine.topology(), &snapshot)?;
        ctx.reporter.report(Progress::CycleFinish {
            completed: cycle + 1,
            total: plan.cycles,
            observables,
        });

        state.set_lambda(schedule.value(cycle + 1));
        engine.apply_alchemical_state(&state)?;
    }
    Ok(())
}
