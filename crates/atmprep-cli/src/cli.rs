use atmprep::engine::phases::Phase;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "atmprep - staged equilibration of solvated protein-ligand systems for Alchemical Transfer Method free-energy calculations.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Path to the run configuration file in TOML format.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Directory for checkpoints, structures and cycle logs.
    /// Defaults to the directory of the input topology.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Resume the protocol at this phase instead of the beginning.
    /// Requires the checkpoint of the preceding phase to exist.
    #[arg(long, value_name = "PHASE", value_enum)]
    pub start_from: Option<StartPhase>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Command-line names of the protocol phases.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPhase {
    Minimize,
    Thermalize,
    Npt,
    Nvt,
    Anneal,
    Equilibrate,
}

impl From<StartPhase> for Phase {
    fn from(p: StartPhase) -> Self {
        match p {
            StartPhase::Minimize => Phase::Minimize,
            StartPhase::Thermalize => Phase::Thermalize,
            StartPhase::Npt => Phase::NptEquilibration,
            StartPhase::Nvt => Phase::NvtEquilibration,
            StartPhase::Anneal => Phase::LambdaAnnealing,
            StartPhase::Equilibrate => Phase::LambdaEquilibration,
        }
    }
}
