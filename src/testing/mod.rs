//! Declarative scenarios
//!
//! Reads YAML scenario files and runs their steps as engine commands.
//! Every string in a step goes through variable substitution first.

mod config;
mod runner;

pub use config::{ScenarioFile, Step};
pub use runner::YamlScenario;
