//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{self, config_path};
use super::Result;

/// Default directory holding profile files
pub const PROFILE_PATH_DEFAULT: &str = "./profiles/";
/// Default profile name
pub const PROFILE_DEFAULT: &str = "default";
/// Default root directory for run results
pub const RESULT_PATH_DEFAULT: &str = "./results";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Run defaults
    #[serde(default)]
    pub run: RunConfig,
}

/// Defaults for a run, overridable from the command line
#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    /// Profile name, without extension
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Directory holding profile files
    #[serde(default = "default_profile_path")]
    pub profile_path: PathBuf,

    /// Root directory for run results
    #[serde(default = "default_result_path")]
    pub result_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            profile_path: default_profile_path(),
            result_path: default_result_path(),
        }
    }
}

fn default_profile() -> String {
    PROFILE_DEFAULT.to_string()
}
fn default_profile_path() -> PathBuf {
    PathBuf::from(PROFILE_PATH_DEFAULT)
}
fn default_result_path() -> PathBuf {
    PathBuf::from(RESULT_PATH_DEFAULT)
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

/// Execution options for one engine run
#[derive(Debug, Clone)]
pub struct Options {
    /// Profile name, without extension
    pub profile: String,
    /// Directory holding profile files
    pub profile_path: PathBuf,
    /// Root directory for run results
    pub result_path: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        RunConfig::default().into()
    }
}

impl From<RunConfig> for Options {
    fn from(run: RunConfig) -> Self {
        Self {
            profile: run.profile,
            profile_path: run.profile_path,
            result_path: run.result_path,
        }
    }
}

impl Options {
    /// Apply command-line overrides on top of configured values
    pub fn with_overrides(
        mut self,
        profile: Option<String>,
        profile_path: Option<PathBuf>,
        result_path: Option<PathBuf>,
    ) -> Self {
        if let Some(profile) = profile {
            tracing::debug!(%profile, "use designated profile");
            self.profile = profile;
        }
        if let Some(profile_path) = profile_path {
            tracing::debug!(profile_path = %profile_path.display(), "use designated profile path");
            self.profile_path = profile_path;
        }
        if let Some(result_path) = result_path {
            self.result_path = result_path;
        }
        self
    }

    /// Full path of the profile file these options select
    pub fn profile_file(&self) -> PathBuf {
        let path = paths::profile_file(&self.profile_path, &self.profile);
        tracing::info!(profile_path = %path.display(), "resolved profile path");
        path
    }
}
