//! Two-pass package releases.
//!
//! A release is a build with ceremony around it: the repository must be
//! clean, the version must beat everything already released, a
//! verification build must pass before anything is installed, and the
//! installed tree gains a provenance record before the repository is
//! tagged. The coordinator owns that ordering; the builds themselves go
//! through the ordinary orchestrator.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::builder::orchestrator::BuildOrchestrator;
use crate::resolver::PathResolver;
use crate::util::fs as futil;
use crate::vcs::{ReleaseVcs, VcsError};

/// Name of the provenance record written at the version root.
pub const RELEASE_RECORD_FILE: &str = "release.toml";

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("cannot release `{name}-{target}`: already-released version {existing} is equal or newer")]
    VersionExists {
        name: String,
        existing: Version,
        target: Version,
    },

    #[error("package has no version; releases require a versioned package")]
    UnversionedPackage,

    #[error(
        "repository root {} does not match the package directory {}",
        .vcs_root.display(),
        .package_dir.display()
    )]
    MismatchedVcs {
        vcs_root: PathBuf,
        package_dir: PathBuf,
    },

    #[error(transparent)]
    Vcs(#[from] VcsError),
}

/// Provenance of one released version, stored next to its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Repository revision the release was built from
    pub revision: String,

    /// Commit summaries since the previous release, newest first
    pub changelog: Vec<String>,

    /// Highest version released before this one, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<Version>,

    /// Revision of that previous release, when its record was readable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_revision: Option<String>,
}

impl ReleaseRecord {
    pub fn load(path: &Path) -> Result<Self> {
        let content = futil::read_to_string(path)?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse release record: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        let with_header = format!(
            "# This file is automatically generated by Slipway.\n\
             # It is not intended for manual editing.\n\n\
             {content}"
        );

        futil::write_string(path, &with_header)
            .with_context(|| format!("failed to write release record: {}", path.display()))
    }
}

/// Runs the release protocol around a [`BuildOrchestrator`].
pub struct ReleaseCoordinator<'a> {
    orchestrator: &'a BuildOrchestrator<'a>,
    vcs: &'a dyn ReleaseVcs,
    message: Option<String>,
}

impl std::fmt::Debug for ReleaseCoordinator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseCoordinator")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl<'a> ReleaseCoordinator<'a> {
    /// Pair an orchestrator with the repository it builds from.
    ///
    /// The repository root must be the package working directory;
    /// releasing a package from somebody else's checkout is refused.
    pub fn new(
        orchestrator: &'a BuildOrchestrator<'a>,
        vcs: &'a dyn ReleaseVcs,
    ) -> Result<Self, ReleaseError> {
        let vcs_root = canonical(vcs.root());
        let package_dir = canonical(orchestrator.working_dir());
        if vcs_root != package_dir {
            return Err(ReleaseError::MismatchedVcs {
                vcs_root: vcs.root().to_path_buf(),
                package_dir: orchestrator.working_dir().to_path_buf(),
            });
        }

        Ok(ReleaseCoordinator {
            orchestrator,
            vcs,
            message: None,
        })
    }

    /// Set the tag message.
    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }

    /// Release the package to `install_path`.
    ///
    /// `Ok(false)` means a build pass failed and nothing was recorded or
    /// tagged. The tag is created last, after the release record is on
    /// disk: if tagging fails, the installed version and its record stay
    /// in place and block a re-release of the same version until the
    /// installed version is removed or the tag is created by hand.
    pub fn release(&self, install_path: &Path, base_build_path: &Path) -> Result<bool> {
        let descriptor = self.orchestrator.descriptor();
        let name = &descriptor.package.name;
        let version = descriptor
            .package
            .version
            .as_ref()
            .ok_or(ReleaseError::UnversionedPackage)?;
        let qualified = descriptor.qualified_name();

        info!("Releasing {}", qualified);
        self.vcs.validate_repository_state()?;

        let (previous_version, previous_revision) =
            self.check_monotonicity(install_path, name, version)?;

        info!("Running verification build");
        let verify = self
            .orchestrator
            .run(install_path, base_build_path, true, false)?;
        if !verify.success {
            error!("Verification build failed; nothing was released");
            return Ok(false);
        }

        info!("Installing {} to {}", qualified, install_path.display());
        let installed = self
            .orchestrator
            .run(install_path, base_build_path, false, true)?;
        if !installed.success {
            error!("Install pass failed; release aborted");
            return Ok(false);
        }

        let record = ReleaseRecord {
            revision: self.vcs.current_revision()?,
            changelog: self.vcs.changelog_since(previous_revision.as_deref())?,
            previous_version,
            previous_revision,
        };
        let version_root = install_path.join(descriptor.install_subpath());
        record.save(&version_root.join(RELEASE_RECORD_FILE))?;

        let tag_name = format!("{}-{}", name, version);
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("Released {}", qualified));
        self.vcs.create_tag(&tag_name, &message).with_context(|| {
            format!(
                "failed to tag the release; {} is installed and recorded, so remove {} \
                 or create tag `{}` by hand before retrying",
                qualified,
                version_root.display(),
                tag_name
            )
        })?;

        info!("Released {} as tag {}", qualified, tag_name);
        Ok(true)
    }

    /// Refuse the release unless `version` beats everything installed at
    /// `install_path`, and dig up the previous release for chaining.
    fn check_monotonicity(
        &self,
        install_path: &Path,
        name: &str,
        version: &Version,
    ) -> Result<(Option<Version>, Option<String>)> {
        let scanner = PathResolver::new(vec![install_path.to_path_buf()]);

        let mut previous: Option<(Version, PathBuf)> = None;
        for (installed, root) in scanner.installed_versions(name) {
            if installed >= *version {
                return Err(ReleaseError::VersionExists {
                    name: name.to_string(),
                    existing: installed,
                    target: version.clone(),
                }
                .into());
            }
            if previous.as_ref().map_or(true, |(p, _)| installed > *p) {
                previous = Some((installed, root));
            }
        }

        let Some((previous_version, previous_root)) = previous else {
            return Ok((None, None));
        };

        let record_path = previous_root.join(RELEASE_RECORD_FILE);
        if !record_path.exists() {
            warn!(
                "released version {} at {} has no release record; \
                 the changelog will span the full history",
                previous_version,
                previous_root.display()
            );
            return Ok((Some(previous_version), None));
        }

        let record = ReleaseRecord::load(&record_path)?;
        Ok((Some(previous_version), Some(record.revision)))
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
