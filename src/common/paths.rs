//! Configuration, log and result paths

use std::io;
use std::path::{Path, PathBuf};

/// Name used for the platform project directories
const PROJECT_NAME: &str = "scenario-engine";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/scenario-engine/`
/// - macOS: `~/Library/Application Support/scenario-engine/`
/// - Windows: `%APPDATA%\scenario-engine\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", PROJECT_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", PROJECT_NAME)
        .map(|dirs| dirs.data_dir().join("logs"))
}

/// Make a result path absolute against the current working directory
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Profile file location: `<profile_path>/<profile>.yaml`
pub fn profile_file(profile_path: &Path, profile: &str) -> PathBuf {
    profile_path.join(format!("{profile}.yaml"))
}
