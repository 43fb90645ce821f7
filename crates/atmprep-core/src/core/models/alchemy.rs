use serde::{Deserialize, Serialize};

/// Soft-core parameters of the ATM perturbation potential, held constant for
/// the duration of a preparation run. Energies are in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftCoreParams {
    /// Maximum value of the soft-core capped perturbation energy (kcal/mol).
    pub umax: f64,
    /// Perturbation energy at which the soft-core cap engages (kcal/mol).
    pub ubcore: f64,
    /// Exponent of the soft-core function.
    pub acore: f64,
    /// Transfer direction along the alchemical path (+1 or -1).
    pub direction: i32,
}

impl Default for SoftCoreParams {
    fn default() -> Self {
        Self {
            umax: 1000.0,
            ubcore: 500.0,
            acore: 0.0625,
            direction: 1,
        }
    }
}

/// One point along the alchemical path between the two physical end states.
///
/// `lambda1` and `lambda2` move in lock-step during preparation (symmetric
/// ramp); `alpha` (1/(kcal/mol)), `u0` and `w0coeff` (kcal/mol) are the
/// linear-response parameters of the softplus coupling function and stay at
/// zero for structure preparation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlchemicalState {
    pub lambda1: f64,
    pub lambda2: f64,
    pub alpha: f64,
    pub u0: f64,
    pub w0coeff: f64,
    pub umax: f64,
    pub ubcore: f64,
    pub acore: f64,
    pub direction: i32,
}

impl AlchemicalState {
    /// State at a given coupling value, with `lambda1 == lambda2 == lambda`.
    pub fn at_lambda(lambda: f64, softcore: &SoftCoreParams) -> Self {
        Self {
            lambda1: lambda,
            lambda2: lambda,
            alpha: 0.0,
            u0: 0.0,
            w0coeff: 0.0,
            umax: softcore.umax,
            ubcore: softcore.ubcore,
            acore: softcore.acore,
            direction: softcore.direction,
        }
    }

    /// Fully decoupled initial end state (`lambda = 0`).
    pub fn decoupled(softcore: &SoftCoreParams) -> Self {
        Self::at_lambda(0.0, softcore)
    }

    /// The symmetric coupling value of this state.
    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda1
    }

    /// Moves both coupling parameters to `lambda` in lock-step.
    pub fn set_lambda(&mut self, lambda: f64) {
        self.lambda1 = lambda;
        self.lambda2 = lambda;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoupled_state_has_zero_coupling() {
        let state = AlchemicalState::decoupled(&SoftCoreParams::default());
        assert_eq!(state.lambda1, 0.0);
        assert_eq!(state.lambda2, 0.0);
        assert_eq!(state.alpha, 0.0);
        assert_eq!(state.u0, 0.0);
        assert_eq!(state.w0coeff, 0.0);
    }

    #[test]
    fn at_lambda_sets_both_coupling_parameters() {
        let state = AlchemicalState::at_lambda(0.5, &SoftCoreParams::default());
        assert_eq!(state.lambda1, 0.5);
        assert_eq!(state.lambda2, 0.5);
    }

    #[test]
    fn set_lambda_moves_parameters_in_lock_step() {
        let mut state = AlchemicalState::decoupled(&SoftCoreParams::default());
        state.set_lambda(0.25);
        assert_eq!(state.lambda1, state.lambda2);
        assert_eq!(state.lambda(), 0.25);
    }

    #[test]
    fn softcore_defaults_match_preparation_protocol() {
        let softcore = SoftCoreParams::default();
        assert_eq!(softcore.umax, 1000.0);
        assert_eq!(softcore.ubcore, 500.0);
        assert_eq!(softcore.acore, 0.0625);
        assert_eq!(softcore.direction, 1);
    }
}
