//! Scenario engine
//!
//! Executes test scenarios through a fixed four-phase lifecycle, resolves
//! `${scope.name}` variables from a profile and a per-scenario store, and
//! persists evidence files under a per-run result directory.

pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use engine::{
    Command, CommandResult, CommandStatus, Engine, GlobalContext, Phase, Scenario,
    ScenarioContext, ScenarioStatus,
};
