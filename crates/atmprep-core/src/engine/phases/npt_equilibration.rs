use crate::core::io::cyclelog::CycleLog;
use crate::core::models::alchemy::AlchemicalState;
use crate::core::models::observables::CycleRecord;
use crate::engine::backend::MdEngine;
use crate::engine::context::PrepContext;
use crate::engine::error::EngineError;
use crate::engine::phases::Phase;
use crate::engine::progress::Progress;
use tracing::info;

/// Constant-pressure equilibration at the target temperature: the barostat
/// coupling interval is restored to its configured value.
pub(crate) fn run<E: MdEngine>(ctx: &PrepContext, engine: &mut E) -> Result<(), EngineError> {
    let plan = ctx.config.mintherm.plan();
    info!(
        cycles = plan.cycles,
        barostat_interval = ctx.config.barostat_interval,
        "NPT equilibration."
    );

    engine.set_temperature(ctx.config.temperature)?;
    engine.set_barostat_interval(ctx.config.barostat_interval)?;

    let mut log = CycleLog::create(&ctx.log_path(Phase::NptEquilibration.tag()))?;
    let state = AlchemicalState::decoupled(&ctx.config.softcore);

    for cycle in 0..plan.cycles {
        engine.step(plan.steps_per_cycle)?;
        let observables = engine.observables()?;
        log.append(&CycleRecord::new(ctx.config.temperature, &state, &observables))?;
        ctx.reporter.report(Progress::CycleFinish {
            completed: cycle + 1,
            total: plan.cycles,
            observables,
        });
    }
    Ok(())
}
