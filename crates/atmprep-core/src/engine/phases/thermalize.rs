use crate::core::io::cyclelog::CycleLog;
use crate::core::models::alchemy::AlchemicalState;
use crate::core::models::observables::CycleRecord;
use crate::core::schedule::TemperatureRamp;
use crate::engine::backend::{BAROSTAT_DISABLED_INTERVAL, MdEngine};
use crate::engine::context::PrepContext;
use crate::engine::error::EngineError;
use crate::engine::phases::Phase;
use crate::engine::progress::Progress;
use tracing::info;

/// Heats the system from the initial to the target temperature in equal
/// per-cycle increments, at constant volume (barostat disabled).
pub(crate) fn run<E: MdEngine>(ctx: &PrepContext, engine: &mut E) -> Result<(), EngineError> {
    let plan = ctx.config.mintherm.plan();
    let ramp = TemperatureRamp::new(
        ctx.config.initial_temperature,
        ctx.config.temperature,
        plan.cycles,
    );
    info!(
        cycles = plan.cycles,
        steps_per_cycle = plan.steps_per_cycle,
        initial = ramp.initial(),
        target = ramp.target(),
        "Thermalization ramp."
    );

    engine.set_barostat_interval(BAROSTAT_DISABLED_INTERVAL)?;

    let mut log = CycleLog::create(&ctx.log_path(Phase::Thermalize.tag()))?;
    let state = AlchemicalState::decoupled(&ctx.config.softcore);

    let mut temperature = ramp.initial();
    engine.set_temperature(temperature)?;
    for cycle in 0..plan.cycles {
        engine.step(plan.steps_per_cycle)?;
        let observables = engine.observables()?;
        log.append(&CycleRecord::new(temperature, &state, &observables))?;
        ctx.reporter.report(Progress::CycleFinish {
            completed: cycle + 1,
            total: plan.cycles,
            observables,
        });

        temperature += ramp.increment();
        engine.set_temperature(temperature)?;
    }
    Ok(())
}
