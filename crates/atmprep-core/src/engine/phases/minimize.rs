use crate::engine::backend::MdEngine;
use crate::engine::context::PrepContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use tracing::info;

/// One-shot energy minimization from the raw input coordinates. No cycles,
/// no observable log; the minimized state is handed to thermalization
/// through the checkpoint the sequencer writes.
pub(crate) fn run<E: MdEngine>(ctx: &PrepContext, engine: &mut E) -> Result<(), EngineError> {
    let before = engine.observables()?;
    info!(
        potential_energy = before.potential_energy,
        "Potential energy before minimization."
    );
    ctx.reporter.report(Progress::Message(
        "Energy minimizing the system ...".to_string(),
    ));

    engine.minimize()?;

    let after = engine.observables()?;
    info!(
        potential_energy = after.potential_energy,
        "Potential energy after minimization."
    );
    Ok(())
}
