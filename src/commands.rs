//! CLI command definitions
//!
//! Defines the clap commands for the scenario engine CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenario files in order and write their results
    Run {
        /// YAML scenario files, executed in the given order
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Profile name (default: from config, else "default")
        #[arg(long, short)]
        profile: Option<String>,

        /// Directory holding profile files
        #[arg(long)]
        profile_path: Option<PathBuf>,

        /// Root directory for run results
        #[arg(long)]
        result_path: Option<PathBuf>,
    },

    /// Substitute ${...} variables in a template and print the result
    Resolve {
        /// Text containing variable references
        template: String,

        /// Profile name (default: from config, else "default")
        #[arg(long, short)]
        profile: Option<String>,

        /// Directory holding profile files
        #[arg(long)]
        profile_path: Option<PathBuf>,

        /// Store variable visible to the template, as key=value
        /// Can be specified multiple times: --set user=alice --set id=7
        #[arg(long = "set", value_parser = parse_key_value)]
        store: Vec<(String, String)>,
    },
}

/// Parse a `key=value` pair
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}
