//! The fixed phase catalog of the preparation protocol.
//!
//! Phases run in a fixed order with no branching on simulation outcome. Each
//! phase module exposes a `run` that drives an exclusively owned engine
//! context through the phase's protocol; checkpoint handoff around each phase
//! is the sequencer's job (see [`crate::workflows::prep`]).

pub(crate) mod lambda_annealing;
pub(crate) mod lambda_equilibration;
pub(crate) mod minimize;
pub(crate) mod npt_equilibration;
pub(crate) mod nvt_equilibration;
pub(crate) mod thermalize;

/// The six phases, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Minimize,
    Thermalize,
    NptEquilibration,
    NvtEquilibration,
    LambdaAnnealing,
    LambdaEquilibration,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Minimize,
        Phase::Thermalize,
        Phase::NptEquilibration,
        Phase::NvtEquilibration,
        Phase::LambdaAnnealing,
        Phase::LambdaEquilibration,
    ];

    /// File-name tag of the artifacts this phase produces.
    pub fn tag(self) -> &'static str {
        match self {
            Phase::Minimize => "min",
            Phase::Thermalize => "therm",
            Phase::NptEquilibration => "npt",
            Phase::NvtEquilibration => "equil",
            Phase::LambdaAnnealing => "mdlambda",
            Phase::LambdaEquilibration => "0",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Minimize => "Minimization",
            Phase::Thermalize => "Thermalization",
            Phase::NptEquilibration => "NPT equilibration",
            Phase::NvtEquilibration => "NVT equilibration",
            Phase::LambdaAnnealing => "Alchemical annealing",
            Phase::LambdaEquilibration => "Lambda equilibration",
        }
    }

    /// The phase whose checkpoint this phase consumes; `None` only for the
    /// first phase, which starts from the raw input coordinates.
    pub fn predecessor(self) -> Option<Phase> {
        match self {
            Phase::Minimize => None,
            Phase::Thermalize => Some(Phase::Minimize),
            Phase::NptEquilibration => Some(Phase::Thermalize),
            Phase::NvtEquilibration => Some(Phase::NptEquilibration),
            Phase::LambdaAnnealing => Some(Phase::NvtEquilibration),
            Phase::LambdaEquilibration => Some(Phase::LambdaAnnealing),
        }
    }

    /// Whether the phase's system carries the perturbation force.
    pub fn is_alchemical(self) -> bool {
        matches!(self, Phase::LambdaAnnealing | Phase::LambdaEquilibration)
    }

    /// Whether the phase runs with all solutes positionally restrained (the
    /// final equilibration runs with the base restraint configuration).
    pub fn uses_solute_restraints(self) -> bool {
        !matches!(self, Phase::LambdaEquilibration)
    }
}
