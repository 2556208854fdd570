//! Declarative scenario execution
//!
//! Each YAML step becomes a command with its own id. The command records
//! exactly one result: a `Failure` also ends the phase, an
//! `AssertionError` does not.

use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};

use colored::Colorize;
use uuid::Uuid;

use crate::common::{Error, Result};
use crate::engine::{
    Command, CommandResult, CommandStatus, GlobalContext, Scenario, ScenarioContext,
};

use super::config::{ScenarioFile, Step};

/// A scenario defined in a YAML file
#[derive(Debug)]
pub struct YamlScenario {
    file: ScenarioFile,
    source: PathBuf,
    verbose: bool,
}

impl YamlScenario {
    /// Load and parse a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    /// Parse scenario YAML that came from `source`
    pub fn parse(source: &Path, content: &str) -> Result<Self> {
        let file: ScenarioFile =
            serde_yaml::from_str(content).map_err(|e| Error::scenario_parse(source, e))?;
        if file.name.trim().is_empty() {
            return Err(Error::scenario_parse(source, "scenario name is empty"));
        }
        tracing::debug!(
            name = %file.name,
            description = file.description.as_deref().unwrap_or(""),
            source = %source.display(),
            "loaded scenario"
        );
        Ok(Self {
            file,
            source: source.to_path_buf(),
            verbose: false,
        })
    }

    /// Print each step as it runs
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Directory shell steps run in: the one holding the scenario file
    fn base_dir(&self) -> &Path {
        match self.source.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn run_steps(
        &self,
        steps: &[Step],
        gc: &GlobalContext,
        sc: &mut ScenarioContext,
    ) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            let step_num = i + 1;
            let command = StepCommand {
                id: Uuid::new_v4(),
                step,
                base_dir: self.base_dir(),
            };
            command.execute(gc, sc);

            let outcome = sc.current_phase().and_then(|phase| {
                sc.results(phase)
                    .iter()
                    .rev()
                    .find(|r| r.id == command.id)
                    .map(|r| (r.status, r.message.clone()))
            });

            match outcome {
                Some((CommandStatus::Success, _)) => {
                    if self.verbose {
                        println!("  {} Step {}: {}", "✓".green(), step_num, step.label().dimmed());
                    }
                }
                Some((CommandStatus::AssertionError, message)) => {
                    if self.verbose {
                        println!("  {} Step {}: {}", "✗".yellow(), step_num, message);
                    }
                }
                Some((CommandStatus::Failure, message)) => {
                    if self.verbose {
                        println!("  {} Step {}: {}", "✗".red(), step_num, message);
                    }
                    return Err(Error::StepFailed(format!("step {step_num}: {message}")));
                }
                None => {
                    tracing::warn!(step = step_num, "step recorded no result");
                }
            }
        }
        Ok(())
    }
}

impl Scenario for YamlScenario {
    fn name(&self) -> &str {
        &self.file.name
    }

    fn setup(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()> {
        self.run_steps(&self.file.setup, gc, sc)
    }

    fn exercise(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()> {
        self.run_steps(&self.file.exercise, gc, sc)
    }

    fn verify(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()> {
        self.run_steps(&self.file.verify, gc, sc)
    }

    fn tear_down(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<()> {
        self.run_steps(&self.file.tear_down, gc, sc)
    }
}

/// One YAML step bound to a command id
struct StepCommand<'a> {
    id: Uuid,
    step: &'a Step,
    base_dir: &'a Path,
}

impl Command for StepCommand<'_> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn execute(&self, gc: &GlobalContext, sc: &mut ScenarioContext) {
        let result = match self.run(gc, sc) {
            Ok(result) => result,
            Err(e) => CommandResult::failure(self.id, e.to_string()).with_error(&e),
        };
        sc.record_command_result(result);
    }
}

impl StepCommand<'_> {
    fn run(&self, gc: &GlobalContext, sc: &mut ScenarioContext) -> Result<CommandResult> {
        match self.step {
            Step::Set { key, value } => {
                let key = sc.replace_variables(gc, key)?;
                let value = sc.replace_variables(gc, value)?;
                sc.store.set(key.clone(), value);
                Ok(CommandResult::success(self.id, format!("set {key}")))
            }
            Step::Shell {
                command,
                capture,
                evidence,
                exit_code,
            } => self.run_shell(
                gc,
                sc,
                command,
                capture.as_deref(),
                evidence.as_deref(),
                *exit_code,
            ),
            Step::Assert {
                value,
                equals,
                contains,
            } => {
                let actual = sc.replace_variables(gc, value)?;
                if equals.is_none() && contains.is_none() {
                    return Err(Error::Config(
                        "assert step needs 'equals' or 'contains'".to_string(),
                    ));
                }
                if let Some(expected) = equals {
                    let expected = sc.replace_variables(gc, expected)?;
                    if actual != expected {
                        return Ok(CommandResult::assertion_error(
                            self.id,
                            format!("expected '{expected}', got '{actual}'"),
                        ));
                    }
                }
                if let Some(expected) = contains {
                    let expected = sc.replace_variables(gc, expected)?;
                    if !actual.contains(&expected) {
                        return Ok(CommandResult::assertion_error(
                            self.id,
                            format!("expected value containing '{expected}', got '{actual}'"),
                        ));
                    }
                }
                Ok(CommandResult::success(self.id, format!("assert {actual}")))
            }
            Step::Evidence { name, text } => {
                let name = sc.replace_variables(gc, name)?;
                let text = sc.replace_variables(gc, text)?;
                let evidence_id =
                    sc.register_text_evidence(&name, &text, Some(self as &dyn Command))?;
                Ok(CommandResult::success(
                    self.id,
                    format!("evidence {name} ({evidence_id})"),
                ))
            }
        }
    }

    fn run_shell(
        &self,
        gc: &GlobalContext,
        sc: &mut ScenarioContext,
        command: &str,
        capture: Option<&str>,
        evidence: Option<&str>,
        expected_code: i32,
    ) -> Result<CommandResult> {
        let command = sc.replace_variables(gc, command)?;
        let capture = capture
            .map(|key| sc.replace_variables(gc, key))
            .transpose()?;
        let evidence = evidence
            .map(|name| sc.replace_variables(gc, name))
            .transpose()?;
        tracing::debug!(%command, dir = %self.base_dir.display(), "running shell step");

        let output = ProcessCommand::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(self.base_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::StepFailed(format!("failed to execute '{command}': {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let mut result = match output.status.code() {
            Some(code) if code == expected_code => {
                CommandResult::success(self.id, format!("shell {command}"))
            }
            code => CommandResult::failure(
                self.id,
                format!("'{command}' exited with {code:?}, expected {expected_code}"),
            ),
        };

        if !output.stderr.is_empty() {
            let path = sc.write_detail(&format!("{}.stderr.log", self.id), &output.stderr)?;
            result = result.with_custom_report(path);
        }

        if result.status == CommandStatus::Success {
            if let Some(key) = capture {
                sc.store.set(key, stdout.trim_end());
            }
            if let Some(name) = evidence {
                sc.register_text_evidence(&name, &stdout, Some(self as &dyn Command))?;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Options;
    use crate::engine::{run_scenario, Phase, Profile, ScenarioStatus};
    use tempfile::tempdir;

    fn run_yaml(yaml: &str) -> (ScenarioContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let source = dir.path().join("scenario.yaml");
        let scenario = YamlScenario::parse(&source, yaml).unwrap();
        let gc = GlobalContext::new(
            Options::default(),
            Profile::from_pairs(
                "test",
                [
                    ("greeting", "hello"),
                    ("who", "${store.user}"),
                    ("prefix", "api"),
                ],
            ),
        );
        let mut sc = ScenarioContext::new(scenario.name());
        run_scenario(&gc, &scenario, dir.path(), &mut sc);
        (sc, dir)
    }

    #[test]
    fn test_successful_scenario() {
        let (sc, _dir) = run_yaml(
            r#"
name: greet
setup:
  - action: set
    key: user
    value: alice
exercise:
  - action: shell
    command: echo "${profile.greeting} ${who}"
    capture: output
    evidence: output.txt
verify:
  - action: assert
    value: ${store.output}
    equals: hello alice
"#,
        );

        assert_eq!(sc.status(), Some(ScenarioStatus::Success));
        assert_eq!(sc.store.get("output"), Some("hello alice"));
        assert_eq!(sc.results(Phase::Exercise).len(), 1);

        let shell_id = sc.results(Phase::Exercise)[0].id;
        let evidence = sc.evidences().next().unwrap();
        assert_eq!(evidence.command_id, Some(shell_id));
        assert_eq!(std::fs::read_to_string(&evidence.path).unwrap(), "hello alice\n");
    }

    #[test]
    fn test_assertion_mismatch_is_not_fatal() {
        let (sc, _dir) = run_yaml(
            r#"
name: mismatch
verify:
  - action: assert
    value: ${profile.greeting}
    contains: bye
  - action: set
    key: after
    value: reached
"#,
        );

        assert_eq!(sc.status(), Some(ScenarioStatus::AssertionError));
        assert_eq!(sc.store.get("after"), Some("reached"));
        assert_eq!(sc.results(Phase::Verify)[0].status, CommandStatus::AssertionError);
    }

    #[test]
    fn test_failed_shell_ends_scenario() {
        let (sc, _dir) = run_yaml(
            r#"
name: broken
exercise:
  - action: shell
    command: echo oops >&2; exit 3
verify:
  - action: set
    key: unreachable
    value: "yes"
"#,
        );

        assert_eq!(sc.status(), Some(ScenarioStatus::Failure));
        assert!(sc.results(Phase::Verify).is_empty());
        assert!(sc.store.get("unreachable").is_none());

        let failed = &sc.results(Phase::Exercise)[0];
        assert_eq!(failed.status, CommandStatus::Failure);
        let report = failed.custom_report_path.as_ref().unwrap();
        assert_eq!(std::fs::read_to_string(report).unwrap(), "oops\n");
    }

    #[test]
    fn test_keys_are_templated() {
        let (sc, _dir) = run_yaml(
            r#"
name: templated-keys
setup:
  - action: set
    key: ${profile.prefix}_user
    value: alice
exercise:
  - action: shell
    command: echo token-${store.api_user}
    capture: ${prefix}_token
    evidence: ${profile.prefix}.txt
"#,
        );

        assert_eq!(sc.status(), Some(ScenarioStatus::Success));
        assert_eq!(sc.store.get("api_user"), Some("alice"));
        assert_eq!(sc.store.get("${profile.prefix}_user"), None);
        assert_eq!(sc.store.get("api_token"), Some("token-alice"));
        assert_eq!(sc.evidences().next().unwrap().name, "api.txt");
    }

    #[test]
    fn test_unresolved_capture_key_fails_before_running() {
        let (sc, dir) = run_yaml(
            r#"
name: bad-capture
exercise:
  - action: shell
    command: touch ran.txt
    capture: ${store.missing}
"#,
        );

        assert_eq!(sc.status(), Some(ScenarioStatus::Failure));
        assert_eq!(sc.results(Phase::Exercise)[0].status, CommandStatus::Failure);
        assert!(!dir.path().join("ran.txt").exists());
    }

    #[test]
    fn test_expected_exit_code() {
        let (sc, _dir) = run_yaml(
            r#"
name: expected-exit
exercise:
  - action: shell
    command: exit 2
    exit_code: 2
"#,
        );
        assert_eq!(sc.status(), Some(ScenarioStatus::Success));
    }

    #[test]
    fn test_unresolved_variable_fails_step() {
        let (sc, _dir) = run_yaml(
            r#"
name: unresolved
setup:
  - action: set
    key: url
    value: ${profile.missing}
"#,
        );

        assert_eq!(sc.status(), Some(ScenarioStatus::Failure));
        let failed = &sc.results(Phase::Setup)[0];
        assert_eq!(failed.status, CommandStatus::Failure);
        assert!(failed.error.as_deref().unwrap().contains("profile.missing"));
    }

    #[test]
    fn test_evidence_step() {
        let (sc, _dir) = run_yaml(
            r#"
name: evidence
verify:
  - action: evidence
    name: note.txt
    text: greeting was ${profile.greeting}
"#,
        );

        assert_eq!(sc.status(), Some(ScenarioStatus::Success));
        let evidence = sc.evidences().next().unwrap();
        assert_eq!(evidence.name, "note.txt");
        assert_eq!(
            std::fs::read_to_string(&evidence.path).unwrap(),
            "greeting was hello"
        );
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = YamlScenario::parse(Path::new("x.yaml"), "name: \"  \"\n").unwrap_err();
        assert!(matches!(err, Error::ScenarioParse { .. }));
    }
}
