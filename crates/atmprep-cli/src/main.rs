mod cli;
mod config;
mod error;
mod logging;

use crate::cli::Cli;
use crate::error::Result;
use clap::Parser;
use std::time::Instant;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, &cli.log_file)?;

    info!("🚀 atmprep v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let started = Instant::now();
    let result = run_prep(&cli);

    match &result {
        Ok(_) => {
            info!("✅ Preparation finished in {:.1?}.", started.elapsed());
            println!("✅ Preparation finished in {:.1?}.", started.elapsed());
        }
        Err(e) => {
            error!("❌ Preparation failed: {}", e);
            eprintln!("❌ Preparation failed: {}", e);
        }
    }

    result
}

#[cfg(feature = "openmm")]
fn run_prep(cli: &Cli) -> Result<()> {
    use atmprep::core::io::checkpoint::CheckpointStore;
    use atmprep::engine::phases::Phase;
    use atmprep::engine::progress::{Progress, ProgressReporter};
    use atmprep::openmm::OpenMmFactory;
    use atmprep::workflows::prep;

    let app = config::PartialPrepConfig::from_file(&cli.config)?.merge_with_cli(cli)?;
    std::fs::create_dir_all(&app.output_dir)?;

    info!(
        "Preparing '{}' into {:?} on platform {:?}.",
        app.job.basename, app.output_dir, app.core_config.platform
    );

    let store = CheckpointStore::new(&app.output_dir);
    let factory = OpenMmFactory::new();
    let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
        Progress::PhaseStart { name } => println!("▶ {}", name),
        Progress::PhaseFinish => println!("  done"),
        Progress::CycleFinish {
            completed,
            total,
            observables,
        } => {
            println!(
                "  cycle {}/{}  T = {:.1} K  V = {:.1} Å³",
                completed, total, observables.temperature, observables.volume
            )
        }
        Progress::Message(message) => println!("  {}", message),
    }));

    let report = match cli.start_from {
        Some(start) => prep::run_from(
            Phase::from(start),
            &app.job,
            &app.core_config,
            &factory,
            &store,
            &reporter,
        )?,
        None => prep::run(&app.job, &app.core_config, &factory, &store, &reporter)?,
    };

    for output in &report.phases {
        info!(
            "{}: checkpoint {:?}, structure {:?}",
            output.phase.name(),
            output.checkpoint,
            output.structure
        );
    }

    Ok(())
}

#[cfg(not(feature = "openmm"))]
fn run_prep(cli: &Cli) -> Result<()> {
    // Validate the configuration even without a backend so operators can
    // check their input files on machines without an OpenMM installation.
    let app = config::PartialPrepConfig::from_file(&cli.config)?.merge_with_cli(cli)?;
    info!("Configuration for '{}' is valid.", app.job.basename);

    Err(error::CliError::Config(
        "this binary was built without a simulation backend; rebuild with `--features openmm`"
            .to_string(),
    ))
}
