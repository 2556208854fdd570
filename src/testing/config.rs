//! Declarative scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenario files.

use serde::Deserialize;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct ScenarioFile {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Steps preparing the system under test
    #[serde(default)]
    pub setup: Vec<Step>,
    /// Steps running the behavior under test
    #[serde(default)]
    pub exercise: Vec<Step>,
    /// Steps checking the outcome
    #[serde(default)]
    pub verify: Vec<Step>,
    /// Steps cleaning up
    #[serde(default)]
    pub tear_down: Vec<Step>,
}

/// A single step; every string field is templated
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Set a store variable
    Set {
        key: String,
        value: String,
    },
    /// Run a shell command
    Shell {
        /// Command line passed to `sh -c`
        command: String,
        /// Store variable receiving trimmed stdout
        capture: Option<String>,
        /// Evidence file name receiving stdout
        evidence: Option<String>,
        /// Expected exit code (default: 0)
        #[serde(default)]
        exit_code: i32,
    },
    /// Compare a value against expectations
    Assert {
        value: String,
        /// Expected exact value
        equals: Option<String>,
        /// Expected substring
        contains: Option<String>,
    },
    /// Register text as evidence
    Evidence {
        name: String,
        text: String,
    },
}

impl Step {
    /// Short label for logs and reports
    pub fn label(&self) -> String {
        match self {
            Step::Set { key, .. } => format!("set {key}"),
            Step::Shell { command, .. } => format!("shell {command}"),
            Step::Assert { value, .. } => format!("assert {value}"),
            Step::Evidence { name, .. } => format!("evidence {name}"),
        }
    }
}
