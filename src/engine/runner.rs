//! Scenario execution state machine
//!
//! A scenario moves through Setup, Exercise, Verify and TearDown strictly in
//! that order. The first handler error ends the scenario with a `Failure`
//! verdict; otherwise the verdict is judged from the recorded results.

use std::path::Path;

use super::command::CommandStatus;
use super::context::{GlobalContext, ScenarioContext, ScenarioDirs, ScenarioStatus};
use super::phase::Phase;
use crate::common::{Error, Result};

/// Directory for per-command detail reports
pub const DETAILS_DIR: &str = "details";
/// Directory for evidences
pub const EVIDENCES_DIR: &str = "evidences";

/// A named unit of test logic with a four-phase lifecycle
///
/// Handlers get read-only access to the run and exclusive access to the
/// scenario's own context. Returning an error ends the scenario.
pub trait Scenario {
    /// Display name, also used for the result directory
    fn name(&self) -> &str;

    /// Prepare the system under test
    fn setup(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()>;

    /// Run the behavior under test
    fn exercise(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()>;

    /// Check the outcome
    fn verify(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()>;

    /// Clean up after the test
    fn tear_down(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()>;
}

fn run_phase(
    scenario: &dyn Scenario,
    phase: Phase,
    gc: &GlobalContext,
    sc: &mut ScenarioContext,
) -> Result<()> {
    match phase {
        Phase::Setup => scenario.setup(gc, sc),
        Phase::Exercise => scenario.exercise(gc, sc),
        Phase::Verify => scenario.verify(gc, sc),
        Phase::TearDown => scenario.tear_down(gc, sc),
    }
}

/// Create `<run dir>/<name>_<id>/{details,evidences}`
fn provision(run_dir: &Path, sc: &ScenarioContext) -> Result<ScenarioDirs> {
    let storage = &sc.storage;
    let ensure = |parent: &Path, child: &str| {
        storage.ensure_directory(parent, child).map_err(|e| {
            let path = parent.join(child);
            tracing::error!(dir = %path.display(), error = %e, "failure create result dir");
            Error::provisioning(path, e)
        })
    };

    let result_dir = ensure(run_dir, &format!("{}_{}", sc.name(), sc.id()))?;
    let details_dir = ensure(&result_dir, DETAILS_DIR)?;
    let evidences_dir = ensure(&result_dir, EVIDENCES_DIR)?;

    Ok(ScenarioDirs {
        result_dir,
        evidences_dir,
        details_dir,
    })
}

/// Drive one scenario through its lifecycle
///
/// Never returns an error: every outcome ends up in `sc`.
pub fn run_scenario(
    gc: &GlobalContext,
    scenario: &dyn Scenario,
    run_dir: &Path,
    sc: &mut ScenarioContext,
) {
    sc.begin();

    match provision(run_dir, sc) {
        Ok(dirs) => sc.provision(dirs),
        Err(err) => {
            sc.fail(err);
            return;
        }
    }

    for phase in Phase::ALL {
        tracing::info!(scenario = %sc.name(), %phase, "start phase");
        sc.enter(phase);
        if let Err(err) = run_phase(scenario, phase, gc, sc) {
            tracing::warn!(scenario = %sc.name(), %phase, error = %err, "error in phase");
            sc.fail(Error::phase_fatal(phase, err));
            return;
        }
        tracing::info!(scenario = %sc.name(), %phase, "end phase");
    }

    let status = judge_scenario_result(sc);
    sc.complete(status);
}

/// Compute the verdict of a scenario whose four phases all completed
///
/// Any `AssertionError` result, scanned in phase order, makes the verdict
/// `AssertionError`. `Failure` results alone leave it at `Success`.
pub fn judge_scenario_result(sc: &ScenarioContext) -> ScenarioStatus {
    match sc.first_phase_with(CommandStatus::AssertionError) {
        Some(phase) => {
            tracing::info!(scenario = %sc.name(), %phase, "scenario assertion error");
            ScenarioStatus::AssertionError
        }
        None => {
            tracing::info!(scenario = %sc.name(), "scenario successful");
            ScenarioStatus::Success
        }
    }
}
