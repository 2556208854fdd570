//! Run-wide and per-scenario contexts
//!
//! `GlobalContext` is built once per engine run and only read while
//! scenarios execute. `ScenarioContext` belongs to a single scenario
//! execution and collects everything that scenario produces.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::command::{CommandResult, CommandStatus};
use super::evidence::Evidence;
use super::phase::{Phase, PhasedResult};
use super::profile::Profile;
use super::runner::{Scenario, DETAILS_DIR};
use super::storage::{FsStorage, Storage};
use crate::common::config::Options;
use crate::common::{Error, Result};

/// Scenario-level verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioStatus {
    Success,
    Failure,
    AssertionError,
}

/// Context object registered by an extension
///
/// The key is chosen by the extension itself.
pub trait ExtensionContext: Any {
    /// Key this extension registers under
    fn extension_key(&self) -> &str;

    /// Access for downcasting to the concrete extension type
    fn as_any(&self) -> &dyn Any;
}

/// Shared, read-mostly state for one engine run
pub struct GlobalContext {
    options: Options,
    profile: Profile,
    extensions: HashMap<String, Box<dyn ExtensionContext>>,
    scenarios: Vec<Box<dyn Scenario>>,
    pub(super) start: Option<DateTime<Local>>,
    pub(super) end: Option<DateTime<Local>>,
}

impl GlobalContext {
    pub fn new(options: Options, profile: Profile) -> Self {
        Self {
            options,
            profile,
            extensions: HashMap::new(),
            scenarios: Vec::new(),
            start: None,
            end: None,
        }
    }

    /// Register an extension under its own key
    ///
    /// A key can only be registered once.
    pub fn register_extension(&mut self, extension: Box<dyn ExtensionContext>) -> Result<()> {
        let key = extension.extension_key().to_string();
        if self.extensions.contains_key(&key) {
            return Err(Error::DuplicateExtension(key));
        }
        tracing::debug!(%key, "registered extension");
        self.extensions.insert(key, extension);
        Ok(())
    }

    /// Get an extension by key
    pub fn extension(&self, key: &str) -> Option<&dyn ExtensionContext> {
        self.extensions.get(key).map(|e| e.as_ref())
    }

    /// Get an extension by key as its concrete type
    pub fn extension_as<T: ExtensionContext>(&self, key: &str) -> Option<&T> {
        self.extension(key)?.as_any().downcast_ref::<T>()
    }

    pub(super) fn push_scenario(&mut self, scenario: Box<dyn Scenario>) {
        self.scenarios.push(scenario);
    }

    pub(super) fn scenarios(&self) -> &[Box<dyn Scenario>] {
        &self.scenarios
    }

    /// Names of the scenarios of this run, in execution order
    pub fn scenario_names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name()).collect()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn start(&self) -> Option<DateTime<Local>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Local>> {
        self.end
    }
}

/// Per-scenario variables, freely read and written by phase handlers
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreVariables {
    variables: HashMap<String, String>,
}

impl StoreVariables {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }
}

/// Directories provisioned for one scenario execution
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioDirs {
    pub result_dir: PathBuf,
    pub evidences_dir: PathBuf,
    pub details_dir: PathBuf,
}

/// Where a scenario is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Pending,
    Running(Phase),
    Terminal,
}

/// Mutable state of one scenario execution
pub struct ScenarioContext {
    id: Uuid,
    name: String,
    lifecycle: Lifecycle,
    results: [Vec<CommandResult>; 4],
    /// Scenario-scoped variables
    pub store: StoreVariables,
    pub(super) evidences: IndexMap<Uuid, Evidence>,
    pub(super) storage: Arc<dyn Storage>,
    dirs: Option<ScenarioDirs>,
    status: Option<ScenarioStatus>,
    error: Option<Error>,
    start: Option<DateTime<Local>>,
    end: Option<DateTime<Local>>,
    duration_seconds: f64,
}

impl ScenarioContext {
    /// Create a context with a fresh run-unique id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_storage(name, Arc::new(FsStorage))
    }

    pub fn with_storage(name: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            lifecycle: Lifecycle::Pending,
            results: Default::default(),
            store: StoreVariables::default(),
            evidences: IndexMap::new(),
            storage,
            dirs: None,
            status: None,
            error: None,
            start: None,
            end: None,
            duration_seconds: 0.0,
        }
    }

    /// Use an existing evidences directory without the orchestrator
    ///
    /// Handy for driving evidence registration directly.
    pub fn with_evidences_dir(mut self, evidences_dir: impl Into<PathBuf>) -> Self {
        let evidences_dir = evidences_dir.into();
        let result_dir = evidences_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| evidences_dir.clone());
        self.dirs = Some(ScenarioDirs {
            details_dir: result_dir.join(DETAILS_DIR),
            result_dir,
            evidences_dir,
        });
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phase currently executing, if any
    pub fn current_phase(&self) -> Option<Phase> {
        match self.lifecycle {
            Lifecycle::Running(phase) => Some(phase),
            Lifecycle::Pending | Lifecycle::Terminal => None,
        }
    }

    /// Whether the scenario reached its terminal state
    pub fn is_finished(&self) -> bool {
        self.lifecycle == Lifecycle::Terminal
    }

    /// Record a phase-tagged command result
    ///
    /// Results only land in the bucket of the active phase. Anything else is
    /// logged and dropped without failing the scenario.
    pub fn record(&mut self, tagged: PhasedResult) {
        match self.lifecycle {
            Lifecycle::Running(active) if active == tagged.phase => {
                self.results[active.index()].push(tagged.result);
            }
            Lifecycle::Running(active) => {
                tracing::warn!(
                    scenario = %self.name,
                    active = %active,
                    tagged = %tagged.phase,
                    command = %tagged.result.id,
                    "discarding command result for inactive phase"
                );
            }
            Lifecycle::Pending | Lifecycle::Terminal => {
                tracing::warn!(
                    scenario = %self.name,
                    tagged = %tagged.phase,
                    command = %tagged.result.id,
                    "discarding command result outside of phase execution"
                );
            }
        }
    }

    /// Record a command result against the active phase
    pub fn record_command_result(&mut self, result: CommandResult) {
        match self.current_phase() {
            Some(phase) => self.record(PhasedResult::new(phase, result)),
            None => {
                tracing::warn!(
                    scenario = %self.name,
                    command = %result.id,
                    "unknown scenario phase, command result not recorded"
                );
            }
        }
    }

    /// Results recorded during a phase, in recording order
    pub fn results(&self, phase: Phase) -> &[CommandResult] {
        &self.results[phase.index()]
    }

    /// First phase (in execution order) holding a result with the given status
    pub fn first_phase_with(&self, status: CommandStatus) -> Option<Phase> {
        Phase::ALL
            .into_iter()
            .find(|phase| self.results(*phase).iter().any(|r| r.status == status))
    }

    /// Registered evidences in registration order
    pub fn evidences(&self) -> impl Iterator<Item = &Evidence> {
        self.evidences.values()
    }

    pub fn evidence_count(&self) -> usize {
        self.evidences.len()
    }

    pub fn dirs(&self) -> Option<&ScenarioDirs> {
        self.dirs.as_ref()
    }

    /// Write a detail report file into the details directory
    pub fn write_detail(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        let details_dir = self
            .dirs
            .as_ref()
            .map(|d| &d.details_dir)
            .ok_or(Error::NotProvisioned("details"))?;
        let path = details_dir.join(file_name);
        let written = self.storage.write_file(&path, contents)?;
        if written != contents.len() {
            return Err(Error::IncompleteWrite {
                path,
                written,
                expected: contents.len(),
            });
        }
        Ok(path)
    }

    pub fn status(&self) -> Option<ScenarioStatus> {
        self.status
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn start(&self) -> Option<DateTime<Local>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Local>> {
        self.end
    }

    /// Wall-clock duration; stays zero when the scenario failed
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    // === Lifecycle transitions, driven by the runner ===

    pub(super) fn begin(&mut self) {
        self.start = Some(Local::now());
    }

    pub(super) fn provision(&mut self, dirs: ScenarioDirs) {
        debug_assert!(self.dirs.is_none(), "scenario directories set twice");
        self.dirs = Some(dirs);
    }

    pub(super) fn enter(&mut self, phase: Phase) {
        debug_assert!(
            match self.lifecycle {
                Lifecycle::Pending => phase == Phase::Setup,
                Lifecycle::Running(prev) => prev.index() + 1 == phase.index(),
                Lifecycle::Terminal => false,
            },
            "phases must advance one step at a time"
        );
        self.lifecycle = Lifecycle::Running(phase);
    }

    pub(super) fn fail(&mut self, error: Error) {
        self.lifecycle = Lifecycle::Terminal;
        self.end = Some(Local::now());
        self.status = Some(ScenarioStatus::Failure);
        self.error = Some(error);
    }

    pub(super) fn complete(&mut self, status: ScenarioStatus) {
        self.lifecycle = Lifecycle::Terminal;
        let end = Local::now();
        self.end = Some(end);
        self.status = Some(status);
        if let Some(start) = self.start {
            self.duration_seconds = (end - start)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();
        }
    }
}
