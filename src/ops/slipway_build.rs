//! Implementation of `slipway build`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::builder::{plan_builds, BuildOrchestrator, BuildReport, CommandBackend};
use crate::core::load_package_descriptor;
use crate::resolver::PathResolver;
use crate::util::Config;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Remove unit build directories before building
    pub clean: bool,

    /// Install the build products into the local packages path
    pub install: bool,

    /// Override the install destination
    pub install_path: Option<PathBuf>,

    /// Write per-variant activation scripts instead of building
    pub env_scripts: bool,
}

/// Render the working directory's planned build units as JSON.
pub fn render_plan(working_dir: &Path) -> Result<String> {
    let (descriptor, _) = load_package_descriptor(working_dir)?;
    let units = plan_builds(&descriptor);
    Ok(serde_json::to_string_pretty(&units)?)
}

/// Build the package in `working_dir`.
pub fn build(working_dir: &Path, config: &Config, opts: &BuildOptions) -> Result<BuildReport> {
    if opts.env_scripts && opts.install {
        bail!("activation scripts cannot be installed; use --scripts without --install");
    }

    let (descriptor, metadata_path) = load_package_descriptor(working_dir)?;

    let search_paths = match &opts.install_path {
        // An explicit install destination stands in for the local
        // packages path during resolution too, so what was installed
        // there before is visible now.
        Some(path) => {
            let mut paths = vec![path.clone()];
            if let Some(releases) = config.release_packages_path() {
                paths.push(releases);
            }
            paths.extend(config.paths.search.iter().cloned());
            paths
        }
        None => config
            .build_search_paths()
            .context("could not determine the home directory; set [paths] in the config")?,
    };
    debug!("package search paths: {:?}", search_paths);
    let resolver = PathResolver::new(search_paths);

    let backend = if opts.env_scripts {
        CommandBackend::from_descriptor(&descriptor).with_env_scripts()
    } else {
        CommandBackend::from_descriptor(&descriptor)
    };

    let install_path = match &opts.install_path {
        Some(path) => path.clone(),
        None => config.local_packages_path().context(
            "could not determine the home directory; set [paths] local_packages in the config",
        )?,
    };
    let base_build_path = working_dir.join(config.build_directory());

    let orchestrator = BuildOrchestrator::new(
        &descriptor,
        &metadata_path,
        working_dir,
        &resolver,
        &backend,
    );
    orchestrator.run(&install_path, &base_build_path, opts.clean, opts.install)
}
