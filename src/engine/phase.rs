//! Scenario lifecycle phases

use serde::Serialize;
use std::fmt;

use super::command::CommandResult;

/// One of the four fixed, ordered stages of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Phase {
    Setup,
    Exercise,
    Verify,
    TearDown,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 4] = [Phase::Setup, Phase::Exercise, Phase::Verify, Phase::TearDown];

    /// Position of the phase in execution order
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "Setup"),
            Phase::Exercise => write!(f, "Exercise"),
            Phase::Verify => write!(f, "Verify"),
            Phase::TearDown => write!(f, "TearDown"),
        }
    }
}

/// A command result tagged with the phase it belongs to
#[derive(Debug, Clone)]
pub struct PhasedResult {
    pub phase: Phase,
    pub result: CommandResult,
}

impl PhasedResult {
    pub fn new(phase: Phase, result: CommandResult) -> Self {
        Self { phase, result }
    }
}
