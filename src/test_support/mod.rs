//! Test utilities and mocks for Slipway unit tests.
//!
//! This module provides mock implementations of the resolver, build
//! backend and VCS seams, plus git repository fixtures, so orchestration
//! code can be tested without real resolution, real builds or a real
//! remote.
//!
//! # Example
//!
//! ```rust,ignore
//! use slipway::test_support::{MockBackend, MockResolver};
//!
//! #[test]
//! fn test_example() {
//!     let resolver = MockResolver::new();
//!     let backend = MockBackend::new().with_artifact("lib/libfoo.so");
//!
//!     // Drive an orchestrator with the mocks...
//! }
//! ```

pub mod git;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use semver::Version;

use crate::builder::backend::{BackendRequest, BuildBackend, BuildOutcome, ENV_SCRIPT_FILE};
use crate::core::Requirement;
use crate::resolver::{ResolveError, ResolvedEnvironment, ResolvedPackage, Resolver};
use crate::vcs::{ReleaseVcs, VcsError};

/// Mock resolver that fabricates an installed package per requirement.
///
/// Every requested name resolves to version 1.0.0 under `/fake/<name>`,
/// and the number of resolve calls is recorded so cache behaviour can be
/// asserted.
#[derive(Debug, Default)]
pub struct MockResolver {
    calls: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        MockResolver::default()
    }

    /// How many times `resolve` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolver for MockResolver {
    fn resolve(
        &self,
        requirements: &[Requirement],
        timestamp_ms: u64,
    ) -> Result<ResolvedEnvironment, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let packages = requirements
            .iter()
            .map(|req| ResolvedPackage {
                name: req.name().to_string(),
                version: Version::new(1, 0, 0),
                root: PathBuf::from("/fake").join(req.name()).join("1.0.0"),
            })
            .collect();

        Ok(ResolvedEnvironment::new(requirements, packages, timestamp_ms))
    }
}

/// One build invocation a [`MockBackend`] received.
#[derive(Debug, Clone)]
pub struct RecordedBuild {
    pub build_path: PathBuf,
    pub install: bool,
}

/// Mock build backend with scripted behaviour.
///
/// Records every invocation; can be told to fail a specific call, to
/// produce an artifact file per build, or to write activation scripts
/// the way the real backend does in env-script mode.
#[derive(Debug, Default)]
pub struct MockBackend {
    builds: Mutex<Vec<RecordedBuild>>,
    fail_on_call: Option<usize>,
    artifact: Option<PathBuf>,
    env_scripts: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend::default()
    }

    /// Fail the zero-based `call`th build with a scripted reason.
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Create and report `artifact` (relative to the build dir) on
    /// every successful build.
    pub fn with_artifact(mut self, artifact: &str) -> Self {
        self.artifact = Some(PathBuf::from(artifact));
        self
    }

    /// Write an activation script per build instead of artifacts.
    pub fn with_env_scripts(mut self) -> Self {
        self.env_scripts = true;
        self
    }

    /// Every build invocation so far, in order.
    pub fn recorded_builds(&self) -> Vec<RecordedBuild> {
        self.builds.lock().unwrap().clone()
    }
}

impl BuildBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn build(&self, request: &BackendRequest<'_>) -> Result<BuildOutcome> {
        let call = {
            let mut builds = self.builds.lock().unwrap();
            builds.push(RecordedBuild {
                build_path: request.build_path.to_path_buf(),
                install: request.install,
            });
            builds.len() - 1
        };

        if self.fail_on_call == Some(call) {
            return Ok(BuildOutcome {
                success: false,
                error: Some("scripted failure".to_string()),
                ..Default::default()
            });
        }

        let mut install_artifacts = Vec::new();
        if let Some(artifact) = &self.artifact {
            let path = request.build_path.join(artifact);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, b"artifact")?;
            install_artifacts.push(path);
        }

        let env_script = if self.env_scripts {
            let script = request.build_path.join(ENV_SCRIPT_FILE);
            std::fs::write(&script, "#!/bin/sh\n")?;
            Some(script)
        } else {
            None
        };

        Ok(BuildOutcome {
            success: true,
            install_artifacts,
            env_script,
            error: None,
        })
    }
}

/// Mock VCS with a fixed revision and changelog.
///
/// Records created tags and the revisions changelogs were requested
/// since; can be told to present a dirty work tree or to fail tagging.
#[derive(Debug)]
pub struct MockVcs {
    root: PathBuf,
    revision: String,
    changelog: Vec<String>,
    dirty: bool,
    fail_on_tag: bool,
    tags: Mutex<Vec<(String, String)>>,
    changelog_requests: Mutex<Vec<Option<String>>>,
}

impl MockVcs {
    pub fn new(root: &Path) -> Self {
        MockVcs {
            root: root.to_path_buf(),
            revision: "0123456789abcdef0123456789abcdef01234567".to_string(),
            changelog: vec!["abc1234 Initial import".to_string()],
            dirty: false,
            fail_on_tag: false,
            tags: Mutex::new(Vec::new()),
            changelog_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = revision.to_string();
        self
    }

    pub fn with_changelog(mut self, entries: &[&str]) -> Self {
        self.changelog = entries.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Present a dirty work tree.
    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    /// Fail every `create_tag` call.
    pub fn fail_on_tag(mut self) -> Self {
        self.fail_on_tag = true;
        self
    }

    /// Tags created so far, as `(name, message)` pairs.
    pub fn tags(&self) -> Vec<(String, String)> {
        self.tags.lock().unwrap().clone()
    }

    /// The `since` revision of every changelog request, in order.
    pub fn changelog_requests(&self) -> Vec<Option<String>> {
        self.changelog_requests.lock().unwrap().clone()
    }
}

impl ReleaseVcs for MockVcs {
    fn root(&self) -> &Path {
        &self.root
    }

    fn validate_repository_state(&self) -> Result<(), VcsError> {
        if self.dirty {
            return Err(VcsError::DirtyWorkTree {
                count: 2,
                example: "src/lib.c".to_string(),
            });
        }
        Ok(())
    }

    fn current_revision(&self) -> Result<String, VcsError> {
        Ok(self.revision.clone())
    }

    fn changelog_since(&self, revision: Option<&str>) -> Result<Vec<String>, VcsError> {
        self.changelog_requests
            .lock()
            .unwrap()
            .push(revision.map(String::from));
        Ok(self.changelog.clone())
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<(), VcsError> {
        if self.fail_on_tag {
            return Err(VcsError::TagExists {
                name: name.to_string(),
            });
        }
        self.tags
            .lock()
            .unwrap()
            .push((name.to_string(), message.to_string()));
        Ok(())
    }
}
