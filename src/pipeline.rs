//! End-to-end runs: config files in, report or Dockerfile out.
//!
//! Options are built once by the binaries and passed down; nothing here reads
//! process-wide state.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::command::{self, Command};
use crate::config;
use crate::report::Report;
use crate::validate::{self, Probe, DEFAULT_TIMEOUT};

/// Options for a validation run.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub dockerfile_config: PathBuf,
    pub additional_configs: Vec<PathBuf>,
    pub timeout: Duration,
}

impl ValidateOptions {
    pub fn new(dockerfile_config: impl Into<PathBuf>) -> Self {
        Self {
            dockerfile_config: dockerfile_config.into(),
            additional_configs: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Options for rendering a Dockerfile.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub dockerfile_config: PathBuf,
    pub additional_configs: Vec<PathBuf>,
    pub base_image: String,
}

/// Load and merge the configs, then build every command.
///
/// Fails before anything is probed if a file or descriptor is bad.
pub fn load_commands(primary: &Path, additional: &[PathBuf]) -> Result<Vec<Command>> {
    let descriptors = config::load_descriptors(primary, additional)
        .context("Failed to load dockerfile config")?;
    let commands = command::create_commands(descriptors)
        .context("Failed to build commands from dockerfile config")?;
    Ok(commands)
}

/// Validate every download of the configured commands.
pub fn run_validation<P: Probe + ?Sized>(options: &ValidateOptions, probe: &P) -> Result<Report> {
    let commands = load_commands(&options.dockerfile_config, &options.additional_configs)?;

    let report = Report::from_errors(validate::validate_tools(&commands, probe));
    info!(
        commands = commands.len(),
        failures = report.errors().len(),
        "validation finished"
    );
    Ok(report)
}

/// Render the Dockerfile for the configured commands.
pub fn render(options: &RenderOptions) -> Result<String> {
    let commands = load_commands(&options.dockerfile_config, &options.additional_configs)?;
    Ok(command::render_dockerfile(&options.base_image, &commands))
}
