//! Implementation of `slipway release`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::builder::{BuildOrchestrator, CommandBackend, ReleaseCoordinator};
use crate::core::load_package_descriptor;
use crate::resolver::PathResolver;
use crate::util::Config;
use crate::vcs::GitVcs;

/// Options for the release command.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Tag message
    pub message: Option<String>,

    /// Override the release destination
    pub install_path: Option<PathBuf>,
}

/// Release the package in `working_dir`.
///
/// `Ok(false)` means a build pass failed and nothing was released.
pub fn release(working_dir: &Path, config: &Config, opts: &ReleaseOptions) -> Result<bool> {
    let (descriptor, metadata_path) = load_package_descriptor(working_dir)?;

    let search_paths = match &opts.install_path {
        // The override stands in for the release packages path during
        // resolution too. Local installs stay out of release resolves
        // either way.
        Some(path) => {
            let mut paths = vec![path.clone()];
            paths.extend(config.paths.search.iter().cloned());
            paths
        }
        None => config
            .release_search_paths()
            .context("could not determine the home directory; set [paths] in the config")?,
    };
    debug!("package search paths: {:?}", search_paths);
    let resolver = PathResolver::new(search_paths);
    let backend = CommandBackend::from_descriptor(&descriptor);

    let install_path = match &opts.install_path {
        Some(path) => path.clone(),
        None => config.release_packages_path().context(
            "could not determine the home directory; set [paths] release_packages in the config",
        )?,
    };

    // Release builds get their own scratch area so they never reuse a
    // local build's cached environments.
    let base_build_path = working_dir.join(config.build_directory()).join("release");

    let orchestrator = BuildOrchestrator::new(
        &descriptor,
        &metadata_path,
        working_dir,
        &resolver,
        &backend,
    );
    let vcs = GitVcs::open(working_dir)?;

    let mut coordinator = ReleaseCoordinator::new(&orchestrator, &vcs)?;
    if let Some(message) = &opts.message {
        coordinator = coordinator.with_message(message.clone());
    }

    coordinator.release(&install_path, &base_build_path)
}
