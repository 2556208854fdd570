//! Commands and their recorded outcomes

use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use super::context::{GlobalContext, ScenarioContext};

/// Outcome of a single command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandStatus {
    Success,
    Failure,
    AssertionError,
}

/// Immutable record of one command execution
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub id: Uuid,
    pub status: CommandStatus,
    pub message: String,
    pub custom_report_path: Option<PathBuf>,
    /// Error detail, kept as text so the record stays cloneable
    pub error: Option<String>,
}

impl CommandResult {
    fn new(id: Uuid, status: CommandStatus, message: impl Into<String>) -> Self {
        Self {
            id,
            status,
            message: message.into(),
            custom_report_path: None,
            error: None,
        }
    }

    pub fn success(id: Uuid, message: impl Into<String>) -> Self {
        Self::new(id, CommandStatus::Success, message)
    }

    pub fn failure(id: Uuid, message: impl Into<String>) -> Self {
        Self::new(id, CommandStatus::Failure, message)
    }

    pub fn assertion_error(id: Uuid, message: impl Into<String>) -> Self {
        Self::new(id, CommandStatus::AssertionError, message)
    }

    /// Attach a custom report produced by the command
    pub fn with_custom_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_report_path = Some(path.into());
        self
    }

    /// Attach error detail
    pub fn with_error(mut self, error: &dyn std::error::Error) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// A single executable step within a phase
///
/// Implementations record their own `CommandResult` into the scenario
/// context when executed.
pub trait Command {
    /// Stable identifier of this command
    fn id(&self) -> Uuid;

    /// Execute the command
    fn execute(&self, gc: &GlobalContext, sc: &mut ScenarioContext);
}
