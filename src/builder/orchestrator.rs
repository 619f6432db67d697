//! Sequential orchestration of a package's build units.
//!
//! The orchestrator owns the full per-unit build sequence: prepare the
//! build directory, acquire the resolved environment, invoke the build
//! backend and, when installing, place artifacts into the install tree.
//! Units run strictly in planner order and the first failure stops the
//! run with everything before it left in place.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::builder::backend::{BackendRequest, BuildBackend};
use crate::builder::env_cache::EnvironmentCache;
use crate::builder::plan::{plan_builds, BuildUnit};
use crate::core::{PackageDescriptor, DESCRIPTOR_FILE};
use crate::resolver::{Resolver, ENV_FILE};
use crate::util::fs as futil;

/// How build units are scheduled.
///
/// Only sequential execution exists today; a parallel strategy would be
/// a new variant here rather than a new orchestrator type.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
}

/// The unit a run stopped on, and why.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    /// Position of the unit in planner order
    pub index: usize,
    /// The unit's build subdirectory
    pub subdirectory: PathBuf,
    pub reason: String,
}

/// Result of one orchestrator run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub success: bool,

    /// Activation scripts reported by the backend, in unit order
    pub env_scripts: Vec<PathBuf>,

    /// How many units the run reached, the failed one included
    pub units_attempted: usize,

    pub failure: Option<UnitFailure>,
}

/// Drives builds of every unit of one package.
pub struct BuildOrchestrator<'a> {
    descriptor: &'a PackageDescriptor,
    metadata_path: &'a Path,
    working_dir: &'a Path,
    resolver: &'a dyn Resolver,
    backend: &'a dyn BuildBackend,
    strategy: ExecutionStrategy,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        descriptor: &'a PackageDescriptor,
        metadata_path: &'a Path,
        working_dir: &'a Path,
        resolver: &'a dyn Resolver,
        backend: &'a dyn BuildBackend,
    ) -> Self {
        BuildOrchestrator {
            descriptor,
            metadata_path,
            working_dir,
            resolver,
            backend,
            strategy: ExecutionStrategy::default(),
        }
    }

    /// Override the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        self.descriptor
    }

    pub fn working_dir(&self) -> &Path {
        self.working_dir
    }

    /// Build every unit of the package.
    ///
    /// Artifacts land under `install_path/<name>[/<version>]/<unit subdir>`
    /// when `install` is set, and the package descriptor is copied to the
    /// version root afterwards so the installed package is visible to
    /// resolution. `clean` wipes each unit's build directory first, which
    /// also discards its cached environment.
    pub fn run(
        &self,
        install_path: &Path,
        base_build_path: &Path,
        clean: bool,
        install: bool,
    ) -> Result<BuildReport> {
        match self.strategy {
            ExecutionStrategy::Sequential => {
                self.run_sequential(install_path, base_build_path, clean, install)
            }
        }
    }

    fn run_sequential(
        &self,
        install_path: &Path,
        base_build_path: &Path,
        clean: bool,
        install: bool,
    ) -> Result<BuildReport> {
        let units = plan_builds(self.descriptor);
        let effective_root = install_path.join(self.descriptor.install_subpath());
        let cache = EnvironmentCache::new(self.resolver);

        let mut env_scripts = Vec::new();

        for (position, unit) in units.iter().enumerate() {
            info!("Building {}", self.unit_label(unit));

            let unit_build_path = base_build_path.join(&unit.subdirectory);
            let unit_install_path = effective_root.join(&unit.subdirectory);

            if clean {
                futil::remove_dir_all_if_exists(&unit_build_path)?;
            }
            futil::ensure_dir(&unit_build_path)?;

            let env = cache.acquire(unit, base_build_path, false)?;

            let request = BackendRequest {
                env: &env,
                source_path: self.working_dir,
                build_path: &unit_build_path,
                install_path: &unit_install_path,
                install,
            };
            let outcome = self.backend.build(&request)?;

            if !outcome.success {
                let reason = outcome
                    .error
                    .unwrap_or_else(|| "build backend reported failure".to_string());
                error!("Build of {} failed: {}", self.unit_label(unit), reason);

                return Ok(BuildReport {
                    success: false,
                    env_scripts,
                    units_attempted: position + 1,
                    failure: Some(UnitFailure {
                        index: position,
                        subdirectory: unit.subdirectory.clone(),
                        reason,
                    }),
                });
            }

            if install {
                futil::ensure_dir(&unit_install_path)?;
                for artifact in &outcome.install_artifacts {
                    let relative = artifact.strip_prefix(&unit_build_path).with_context(|| {
                        format!(
                            "backend reported artifact outside the build directory: {}",
                            artifact.display()
                        )
                    })?;
                    let dest = unit_install_path.join(relative);
                    if artifact.is_dir() {
                        futil::copy_dir_all(artifact, &dest)?;
                    } else {
                        futil::copy_file(artifact, &dest)?;
                    }
                }

                let cache_file = EnvironmentCache::cache_path(base_build_path, unit);
                futil::copy_file(&cache_file, &unit_install_path.join(ENV_FILE))?;
            }

            if let Some(script) = outcome.env_script {
                env_scripts.push(script);
            }
        }

        if install {
            futil::copy_file(self.metadata_path, &effective_root.join(DESCRIPTOR_FILE))?;
            info!(
                "Installed {} to {}",
                self.descriptor.qualified_name(),
                effective_root.display()
            );
        }

        Ok(BuildReport {
            success: true,
            env_scripts,
            units_attempted: units.len(),
            failure: None,
        })
    }

    fn unit_label(&self, unit: &BuildUnit) -> String {
        match unit.index {
            Some(i) => {
                let tokens: Vec<&str> = self.descriptor.package.variants[i]
                    .iter()
                    .map(|r| r.as_str())
                    .collect();
                format!(
                    "{} variant {} ({})",
                    self.descriptor.qualified_name(),
                    i,
                    tokens.join(" ")
                )
            }
            None => self.descriptor.qualified_name(),
        }
    }
}
