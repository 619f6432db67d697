//! Per-unit environment caching.
//!
//! The first build of a unit resolves its requirements and persists the
//! result as `env.lock` inside the unit's build directory. Every later
//! build of that unit, including the install pass of a release, loads
//! the file back verbatim instead of re-resolving. That keeps repeat
//! builds deterministic even while new package versions appear; a clean
//! build is the way to pick the world up again.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::builder::plan::BuildUnit;
use crate::resolver::{ResolvedEnvironment, Resolver, ENV_FILE};
use crate::util::fs as futil;

/// Load-or-resolve cache for unit environments.
pub struct EnvironmentCache<'a> {
    resolver: &'a dyn Resolver,
}

impl<'a> EnvironmentCache<'a> {
    pub fn new(resolver: &'a dyn Resolver) -> Self {
        EnvironmentCache { resolver }
    }

    /// Where the cached environment of `unit` lives under `base_path`.
    pub fn cache_path(base_path: &Path, unit: &BuildUnit) -> PathBuf {
        base_path.join(&unit.subdirectory).join(ENV_FILE)
    }

    /// Produce the environment for a unit.
    ///
    /// `force_clean` removes the unit's entire build directory first, so
    /// the resolve always runs fresh. Otherwise a persisted environment
    /// is returned exactly as stored; if it was resolved for a different
    /// requirement set (the descriptor changed since), that is logged
    /// but the cached environment still wins.
    pub fn acquire(
        &self,
        unit: &BuildUnit,
        base_path: &Path,
        force_clean: bool,
    ) -> Result<ResolvedEnvironment> {
        let unit_dir = base_path.join(&unit.subdirectory);
        if force_clean {
            futil::remove_dir_all_if_exists(&unit_dir)?;
        }
        futil::ensure_dir(&unit_dir)?;

        let cache_file = unit_dir.join(ENV_FILE);
        if cache_file.exists() {
            let env = ResolvedEnvironment::load(&cache_file)?;
            if !env.matches_request(&unit.requirements) {
                warn!(
                    "cached environment {} was resolved for a different requirement set; \
                     run a clean build to re-resolve",
                    cache_file.display()
                );
            }
            debug!("reusing cached environment {}", cache_file.display());
            return Ok(env);
        }

        info!(
            "resolving environment: {}",
            unit.requirements
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let env = self.resolver.resolve(&unit.requirements, epoch_millis())?;
        env.save(&cache_file)?;
        Ok(env)
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
