//! CLI command handling
//!
//! Dispatches CLI commands to the engine and formats output.

use colored::Colorize;
use std::path::PathBuf;

use crate::commands::Commands;
use crate::common::config::{Config, Options};
use crate::common::{Error, Result};
use crate::engine::{
    CommandStatus, Engine, Profile, Resolver, RunReport, Scenario, ScenarioReport,
    ScenarioStatus, StoreVariables,
};
use crate::testing::YamlScenario;

/// Dispatch a CLI command
pub fn dispatch(command: Commands, verbose: bool) -> Result<()> {
    match command {
        Commands::Run {
            scenarios,
            profile,
            profile_path,
            result_path,
        } => {
            let options = load_options(profile, profile_path, result_path)?;

            let scenarios = scenarios
                .iter()
                .map(|path| {
                    YamlScenario::load(path)
                        .map(|s| Box::new(s.with_verbose(verbose)) as Box<dyn Scenario>)
                })
                .collect::<Result<Vec<_>>>()?;

            let mut engine = Engine::new(scenarios, Vec::new(), options)?;
            let report = engine.run()?;
            print_report(&report);

            if report.all_passed() {
                Ok(())
            } else {
                Err(Error::TestAssertion(format!(
                    "{} of {} scenarios did not succeed",
                    report.scenarios.len() - report.count(ScenarioStatus::Success),
                    report.scenarios.len()
                )))
            }
        }

        Commands::Resolve {
            template,
            profile,
            profile_path,
            store,
        } => {
            let options = load_options(profile, profile_path, None)?;
            let profile = Profile::load(&options.profile_file())?;

            let mut variables = StoreVariables::default();
            for (key, value) in store {
                variables.set(key, value);
            }

            let resolved = Resolver::new(&profile, &variables).replace(&template)?;
            println!("{}", resolved);
            Ok(())
        }
    }
}

/// Merge the config file with command-line overrides
fn load_options(
    profile: Option<String>,
    profile_path: Option<PathBuf>,
    result_path: Option<PathBuf>,
) -> Result<Options> {
    let config = Config::load()?;
    Ok(Options::from(config.run).with_overrides(profile, profile_path, result_path))
}

fn print_report(report: &RunReport) {
    println!();
    for scenario in &report.scenarios {
        print_scenario(scenario);
    }

    let passed = report.count(ScenarioStatus::Success);
    let failed = report.count(ScenarioStatus::Failure);
    let asserted = report.count(ScenarioStatus::AssertionError);

    println!();
    let summary = format!(
        "{} passed, {} failed, {} assertion errors in {:.2}s",
        passed,
        failed,
        asserted,
        report.duration_seconds()
    );
    if report.all_passed() {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
    println!("Results: {}", report.run_dir.display());
}

fn print_scenario(scenario: &ScenarioReport) {
    let marker = match scenario.status {
        Some(ScenarioStatus::Success) => "✓".green(),
        Some(ScenarioStatus::AssertionError) => "✗".yellow(),
        Some(ScenarioStatus::Failure) | None => "✗".red(),
    };

    println!(
        "{} {} ({:.2}s, {} evidence)",
        marker,
        scenario.name.bold(),
        scenario.duration_seconds,
        scenario.evidences.len()
    );

    if let Some(error) = &scenario.error {
        println!("    {}", error.red());
    }
    for phase in &scenario.phases {
        for result in phase.results.iter().filter(|r| r.status != CommandStatus::Success) {
            println!("    [{}] {}", phase.phase, result.message.dimmed());
        }
    }
}
