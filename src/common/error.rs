//! Error types for the scenario engine
//!
//! Evidence, variable and storage failures are returned to the immediate
//! caller. Only phase handler errors end a scenario.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::engine::Phase;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario engine
#[derive(Error, Debug)]
pub enum Error {
    // === Evidence Errors ===
    #[error("{0} required")]
    Validation(String),

    #[error("Evidence path already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Incomplete write to '{}': wrote {written} of {expected} bytes", path.display())]
    IncompleteWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },

    #[error("Evidence not found: {0}")]
    EvidenceNotFound(String),

    #[error("Invalid evidence name '{0}': must be a single file name")]
    InvalidEvidenceName(String),

    // === Variable Errors ===
    #[error("Cannot resolve variable '{0}'")]
    UnresolvedVariable(String),

    #[error("Variable substitution nested deeper than {limit} levels in '{text}'")]
    SubstitutionDepthExceeded { text: String, limit: usize },

    #[error("Variable '{0}' refers back to itself")]
    VariableCycle(String),

    // === Scenario Errors ===
    #[error("{phase} phase failed: {source}")]
    PhaseFatal {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to provision '{}': {source}", path.display())]
    StorageProvisioning {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Scenario {0} directory not provisioned")]
    NotProvisioned(&'static str),

    #[error("Step failed: {0}")]
    StepFailed(String),

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Extension Errors ===
    #[error("Extension '{0}' is already registered")]
    DuplicateExtension(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read profile '{}': {source}", path.display())]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid profile '{}': {message}", path.display())]
    ProfileParse { path: PathBuf, message: String },

    #[error("Invalid scenario file '{}': {message}", path.display())]
    ScenarioParse { path: PathBuf, message: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error for a missing required input
    pub fn required(what: &str) -> Self {
        Self::Validation(what.to_string())
    }

    /// Wrap a handler error as terminal for the given phase
    pub fn phase_fatal(phase: Phase, source: Error) -> Self {
        Self::PhaseFatal {
            phase,
            source: Box::new(source),
        }
    }

    /// Create a storage provisioning error
    pub fn provisioning(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StorageProvisioning {
            path: path.into(),
            source,
        }
    }

    /// Create a scenario parse error
    pub fn scenario_parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ScenarioParse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        assert_eq!(Error::required("name").to_string(), "name required");
        assert_eq!(Error::required("contents").to_string(), "contents required");
    }

    #[test]
    fn test_phase_fatal_keeps_source() {
        let err = Error::phase_fatal(Phase::Exercise, Error::StepFailed("boom".into()));
        assert_eq!(err.to_string(), "Exercise phase failed: Step failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
