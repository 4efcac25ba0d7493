//! CLI command implementations.

pub mod info;
pub mod init;
pub mod run;

use anyhow::{Context, Result};
use ragline_config::{AppPaths, Config};
use ragline_pipeline::{Orchestrator, Registry};
use std::path::{Path, PathBuf};

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// The `--config` path, or the platform default.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand_path(&path.to_string_lossy())),
        None => Ok(get_paths()?.config_file),
    }
}

/// Load the configuration, pointing at `ragline init` when it is missing.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = config_path(explicit)?;
    if !path.exists() {
        anyhow::bail!(
            "No configuration at {}. Run 'ragline init' first.",
            path.display()
        );
    }
    Config::load_from(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Build the pipeline with every shipped component registered.
pub fn build_orchestrator(config: Config) -> Result<Orchestrator> {
    Orchestrator::new(config, Registry::with_builtins()).context("Failed to initialize pipeline")
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(raw).map(|p| p.into_owned()).unwrap_or_else(|_| raw.to_string()))
}
