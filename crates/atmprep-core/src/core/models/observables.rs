use super::alchemy::AlchemicalState;
use serde::Serialize;

/// Scalar observables read back from the engine after a block of integration
/// steps. Energies in kcal/mol, temperature in kelvin, volume in Å³.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observables {
    pub potential_energy: f64,
    /// Instantaneous contribution of the perturbation potential; zero when no
    /// alchemical force is present in the system.
    pub perturbation_energy: f64,
    pub temperature: f64,
    pub volume: f64,
}

/// One row of the per-cycle output stream.
///
/// Field order is positional and fixed; downstream analysis tooling depends
/// on it. Units are kelvin and kcal/mol. No header row is ever written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleRecord {
    pub temperature: f64,
    pub lambda: f64,
    pub lambda1: f64,
    pub lambda2: f64,
    pub alpha: f64,
    pub u0: f64,
    pub w0: f64,
    pub potential_energy: f64,
    pub perturbation_energy: f64,
}

impl CycleRecord {
    /// Builds a row from the driven temperature and alchemical state of the
    /// current cycle plus the engine readback.
    pub fn new(temperature: f64, state: &AlchemicalState, observables: &Observables) -> Self {
        Self {
            temperature,
            lambda: state.lambda(),
            lambda1: state.lambda1,
            lambda2: state.lambda2,
            alpha: state.alpha,
            u0: state.u0,
            w0: state.w0coeff,
            potential_energy: observables.potential_energy,
            perturbation_energy: observables.perturbation_energy,
        }
    }
}
