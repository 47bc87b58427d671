mod cli;
mod commands;
mod error;
mod io;
mod processing;

use clap::Parser;
use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use crate::cli::{
    Args,
    Commands,
};
use crate::commands::{
    main_baseline,
    main_manual_baseline,
    main_process,
    main_recompute_peak,
    main_write_template,
};
use crate::error::CliError;

// mimalloc seems to work better for windows
// ... more accurately ... not using it causes everything to
// be extremely slow on windows...
#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr, stdout may carry a json result.
    let subscriber = Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE),
    );

    set_global_default(subscriber).expect("Setting default subscriber failed");
    let args = Args::parse();
    let global = args.global;

    match args.command {
        Some(Commands::Process(args)) => main_process(args, &global)?,
        Some(Commands::Baseline(args)) => main_baseline(args, &global)?,
        Some(Commands::RecomputePeak(args)) => main_recompute_peak(args, &global)?,
        Some(Commands::ManualBaseline(args)) => main_manual_baseline(args, &global)?,
        Some(Commands::WriteTemplate(args)) => main_write_template(args)?,
        None => {
            println!("No command provided");
        }
    }
    Ok(())
}
