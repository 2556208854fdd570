//! Scenario engine CLI
//!
//! Runs YAML-defined test scenarios through setup, exercise, verify and
//! tear-down phases, collecting results and evidence per scenario.

use clap::Parser;
use scenario_engine::common::logging;
use scenario_engine::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "scenario-engine", about = "Phase-based test scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Verbose output and debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to the engine log file
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    if cli.log_file {
        if let Some(path) = logging::init_with_file(cli.verbose) {
            tracing::debug!(path = %path.display(), "logging to file");
        }
    } else {
        logging::init_cli(cli.verbose);
    }

    if let Err(e) = cli::dispatch(cli.command, cli.verbose) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
