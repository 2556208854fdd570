//! Run report
//!
//! A serializable snapshot of a finished run, written as `report.json`
//! into the run directory.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::command::CommandResult;
use super::context::{GlobalContext, ScenarioContext, ScenarioStatus};
use super::evidence::Evidence;
use super::phase::Phase;
use super::storage::Storage;
use crate::common::{Error, Result};

/// File name of the JSON report inside the run directory
pub const REPORT_FILE: &str = "report.json";

/// Outcome of a whole engine run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub profile: String,
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
    pub scenarios: Vec<ScenarioReport>,
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub id: Uuid,
    pub status: Option<ScenarioStatus>,
    pub error: Option<String>,
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
    pub duration_seconds: f64,
    pub result_dir: Option<PathBuf>,
    pub phases: Vec<PhaseReport>,
    pub evidences: Vec<Evidence>,
}

/// Results recorded in one phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub results: Vec<CommandResult>,
}

impl From<&ScenarioContext> for ScenarioReport {
    fn from(sc: &ScenarioContext) -> Self {
        Self {
            name: sc.name().to_string(),
            id: sc.id(),
            status: sc.status(),
            error: sc.error().map(Error::to_string),
            start: sc.start(),
            end: sc.end(),
            duration_seconds: sc.duration_seconds(),
            result_dir: sc.dirs().map(|d| d.result_dir.clone()),
            phases: Phase::ALL
                .into_iter()
                .map(|phase| PhaseReport {
                    phase,
                    results: sc.results(phase).to_vec(),
                })
                .collect(),
            evidences: sc.evidences().cloned().collect(),
        }
    }
}

impl RunReport {
    pub fn new(gc: &GlobalContext, run_dir: &Path, executions: &[ScenarioContext]) -> Self {
        Self {
            run_dir: run_dir.to_path_buf(),
            profile: gc.profile().name.clone(),
            start: gc.start(),
            end: gc.end(),
            scenarios: executions.iter().map(ScenarioReport::from).collect(),
        }
    }

    /// Number of scenarios with the given verdict
    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.status == Some(status))
            .count()
    }

    /// Whether every scenario succeeded
    pub fn all_passed(&self) -> bool {
        self.scenarios
            .iter()
            .all(|s| s.status == Some(ScenarioStatus::Success))
    }

    /// Total wall-clock seconds of the run
    pub fn duration_seconds(&self) -> f64 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or_default(),
            _ => 0.0,
        }
    }

    /// Write the report as pretty JSON into the run directory
    pub fn write(&self, storage: &dyn Storage) -> Result<PathBuf> {
        let path = self.run_dir.join(REPORT_FILE);
        let bytes = serde_json::to_vec_pretty(self)?;
        let written = storage.write_file(&path, &bytes)?;
        if written != bytes.len() {
            return Err(Error::IncompleteWrite {
                path,
                written,
                expected: bytes.len(),
            });
        }
        tracing::info!(path = %path.display(), "wrote run report");
        Ok(path)
    }
}
