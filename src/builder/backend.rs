//! Build backend contract and the shell-command implementation.
//!
//! A backend turns one build unit plus its resolved environment into
//! build products. The orchestrator drives backends through the
//! [`BuildBackend`] trait; [`CommandBackend`] is the shipped
//! implementation and simply runs the command declared in the package
//! descriptor through the platform shell.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::PackageDescriptor;
use crate::resolver::ResolvedEnvironment;

/// Name of the activation script written in env-script mode.
pub const ENV_SCRIPT_FILE: &str = "build-env.sh";

/// Everything a backend needs to build one unit.
pub struct BackendRequest<'a> {
    /// Environment the unit was resolved against
    pub env: &'a ResolvedEnvironment,
    /// Package source checkout
    pub source_path: &'a Path,
    /// Unit-specific build directory (exists, may hold prior output)
    pub build_path: &'a Path,
    /// Unit-specific install destination
    pub install_path: &'a Path,
    /// Whether this build will be installed afterwards
    pub install: bool,
}

/// What a backend produced for one unit.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub success: bool,

    /// Files to copy on install, absolute within the build directory
    pub install_artifacts: Vec<PathBuf>,

    /// Activation script, when the backend wrote one
    pub env_script: Option<PathBuf>,

    /// Failure description when `success` is false
    pub error: Option<String>,
}

impl BuildOutcome {
    fn failed(reason: impl Into<String>) -> Self {
        BuildOutcome {
            success: false,
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Interface between the orchestrator and a build system.
///
/// Implementations report ordinary build failures through
/// [`BuildOutcome::success`]; an `Err` means the backend itself could
/// not run (command not spawnable, script not writable).
pub trait BuildBackend {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Build one unit.
    fn build(&self, request: &BackendRequest<'_>) -> Result<BuildOutcome>;
}

/// Backend that runs the descriptor's `[build] command` in a shell.
///
/// In env-script mode the command is not run at all; the unit's
/// activation script is written into the build directory instead, for
/// interactive use.
pub struct CommandBackend {
    command: String,
    artifacts: Vec<PathBuf>,
    env_scripts_only: bool,
}

impl CommandBackend {
    pub fn from_descriptor(descriptor: &PackageDescriptor) -> Self {
        CommandBackend {
            command: descriptor.build.command.clone(),
            artifacts: descriptor.build.artifacts.clone(),
            env_scripts_only: false,
        }
    }

    /// Switch to writing activation scripts instead of building.
    pub fn with_env_scripts(mut self) -> Self {
        self.env_scripts_only = true;
        self
    }

    fn write_env_script(&self, request: &BackendRequest<'_>) -> Result<BuildOutcome> {
        let script = request.build_path.join(ENV_SCRIPT_FILE);
        request.env.write_activation_script(&script)?;

        Ok(BuildOutcome {
            success: true,
            env_script: Some(script),
            ..Default::default()
        })
    }

    fn run_command(&self, request: &BackendRequest<'_>) -> Result<BuildOutcome> {
        let mut cmd = shell_command(&self.command);
        cmd.current_dir(request.build_path);

        for (key, value) in request.env.env_vars() {
            cmd.env(key, value);
        }
        if let Some(path) = prepended_path(request.env) {
            cmd.env("PATH", path);
        }

        cmd.env("SLIPWAY_SOURCE_PATH", request.source_path);
        cmd.env("SLIPWAY_BUILD_PATH", request.build_path);
        cmd.env("SLIPWAY_INSTALL_PATH", request.install_path);
        cmd.env("SLIPWAY_INSTALL", if request.install { "1" } else { "0" });

        debug!("build command: {}", self.command);

        let status = cmd
            .status()
            .with_context(|| format!("failed to run build command: {}", self.command))?;

        if !status.success() {
            return Ok(BuildOutcome::failed(format!(
                "build command '{}' failed with exit code: {:?}",
                self.command,
                status.code()
            )));
        }

        let mut install_artifacts = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let path = request.build_path.join(artifact);
            if !path.exists() {
                return Ok(BuildOutcome::failed(format!(
                    "declared artifact not produced: {}",
                    artifact.display()
                )));
            }
            install_artifacts.push(path);
        }

        Ok(BuildOutcome {
            success: true,
            install_artifacts,
            ..Default::default()
        })
    }
}

impl BuildBackend for CommandBackend {
    fn name(&self) -> &str {
        "command"
    }

    fn build(&self, request: &BackendRequest<'_>) -> Result<BuildOutcome> {
        if self.env_scripts_only {
            self.write_env_script(request)
        } else {
            self.run_command(request)
        }
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

/// `PATH` with the environment's package `bin/` directories in front.
fn prepended_path(env: &ResolvedEnvironment) -> Option<OsString> {
    let mut paths = env.bin_paths();
    if paths.is_empty() {
        return None;
    }
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    match std::env::join_paths(paths) {
        Ok(joined) => Some(joined),
        Err(err) => {
            warn!("cannot prepend package bin directories to PATH: {}", err);
            None
        }
    }
}
