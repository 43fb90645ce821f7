use crate::core::io::cyclelog::CycleLog;
use crate::core::io::pdb::TrajectoryWriter;
use crate::core::models::alchemy::AlchemicalState;
use crate::core::models::observables::CycleRecord;
use crate::engine::backend::{BAROSTAT_DISABLED_INTERVAL, MdEngine};
use crate::engine::context::PrepContext;
use crate::engine::error::EngineError;
use crate::engine::phases::Phase;
use crate::engine::phases::lambda_annealing::LAMBDA_END;
use crate::engine::progress::Progress;
use tracing::info;

/// Long equilibration held at the alchemical midpoint, with trajectory
/// frames sampled every cycle. The resulting checkpoint seeds the production
/// replica at lambda = 1/2.
pub(crate) fn run<E: MdEngine>(ctx: &PrepContext, engine: &mut E) -> Result<(), EngineError> {
    let plan = ctx.config.equilibration.plan();
    info!(
        total_steps = plan.total_steps(),
        "Equilibration at lambda = 1/2 ..."
    );

    engine.set_temperature(ctx.config.temperature)?;
    engine.set_barostat_interval(BAROSTAT_DISABLED_INTERVAL)?;

    let state = AlchemicalState::at_lambda(LAMBDA_END, &ctx.config.softcore);
    engine.apply_alchemical_state(&state)?;

    let tag = Phase::LambdaEquilibration.tag();
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
    }
    Ok(())
}
