//! Scenario engine
//!
//! Runs scenarios one after another through the four-phase lifecycle,
//! storing results under `<result root>/<run timestamp>/<scenario>_<id>/`.

mod command;
mod context;
mod evidence;
mod phase;
mod profile;
mod report;
mod runner;
mod storage;
mod variable;

pub use command::{Command, CommandResult, CommandStatus};
pub use context::{
    ExtensionContext, GlobalContext, ScenarioContext, ScenarioDirs, ScenarioStatus,
    StoreVariables,
};
pub use evidence::{Evidence, EvidenceKind};
pub use phase::{Phase, PhasedResult};
pub use profile::{Profile, ProfileVariable};
pub use report::{PhaseReport, RunReport, ScenarioReport, REPORT_FILE};
pub use runner::{judge_scenario_result, run_scenario, Scenario, DETAILS_DIR, EVIDENCES_DIR};
pub use storage::{FsStorage, Storage};
pub use variable::{Resolver, MAX_SUBSTITUTION_DEPTH};

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::config::Options;
use crate::common::{paths, Error, Result};

/// Format of the per-run directory name
const RUN_DIR_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Engine for one run over a list of scenarios
pub struct Engine {
    global: GlobalContext,
    storage: Arc<dyn Storage>,
    executions: Vec<ScenarioContext>,
}

impl Engine {
    /// Build an engine, loading the profile the options point at
    pub fn new(
        scenarios: Vec<Box<dyn Scenario>>,
        extensions: Vec<Box<dyn ExtensionContext>>,
        options: Options,
    ) -> Result<Self> {
        let profile = Profile::load(&options.profile_file())?;
        Self::with_profile(scenarios, extensions, options, profile)
    }

    /// Build an engine around an already loaded profile
    pub fn with_profile(
        scenarios: Vec<Box<dyn Scenario>>,
        extensions: Vec<Box<dyn ExtensionContext>>,
        options: Options,
        profile: Profile,
    ) -> Result<Self> {
        let mut global = GlobalContext::new(options, profile);
        for extension in extensions {
            global.register_extension(extension)?;
        }
        for scenario in scenarios {
            global.push_scenario(scenario);
        }
        Ok(Self {
            global,
            storage: Arc::new(FsStorage),
            executions: Vec::new(),
        })
    }

    /// Use a different storage backend
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn global(&self) -> &GlobalContext {
        &self.global
    }

    /// Contexts of the scenarios executed so far, in execution order
    pub fn executions(&self) -> &[ScenarioContext] {
        &self.executions
    }

    /// Run every scenario in order and write the run report
    ///
    /// A failing scenario does not stop the run. Only failing to provision
    /// the result root or run directory aborts it. Executions of an earlier
    /// call are discarded.
    pub fn run(&mut self) -> Result<RunReport> {
        self.executions.clear();
        self.global.end = None;
        let start = Local::now();
        self.global.start = Some(start);

        let result_root = self.create_result_root()?;
        let run_dir = self
            .storage
            .ensure_directory(&result_root, &start.format(RUN_DIR_FORMAT).to_string())
            .map_err(|e| {
                tracing::error!(error = %e, "failure create run dir");
                Error::provisioning(result_root.join(start.format(RUN_DIR_FORMAT).to_string()), e)
            })?;

        // Scenarios run strictly one at a time.
        for (index, scenario) in self.global.scenarios().iter().enumerate() {
            let name = scenario.name();
            tracing::info!(index, name, "start scenario");

            let mut sc = ScenarioContext::with_storage(name, self.storage.clone());
            run_scenario(&self.global, scenario.as_ref(), &run_dir, &mut sc);
            debug_assert!(sc.is_finished(), "scenario left unfinished");

            tracing::info!(
                index,
                name,
                status = ?sc.status(),
                duration_seconds = sc.duration_seconds(),
                "end scenario"
            );
            self.executions.push(sc);
        }

        self.global.end = Some(Local::now());

        let report = RunReport::new(&self.global, &run_dir, &self.executions);
        report.write(self.storage.as_ref())?;
        Ok(report)
    }

    fn create_result_root(&self) -> Result<PathBuf> {
        let configured = &self.global.options().result_path;
        let root = paths::absolute(configured).map_err(|e| Error::provisioning(configured, e))?;

        if root.is_dir() {
            tracing::info!(result_dir = %root.display(), "already exists result dir");
            return Ok(root);
        }

        let parent = root.parent().unwrap_or_else(|| Path::new("/"));
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Config(format!("invalid result path '{}'", root.display())))?;

        self.storage.ensure_directory(parent, &name).map_err(|e| {
            tracing::error!(error = %e, "failure create result root dir");
            Error::provisioning(&root, e)
        })
    }
}
