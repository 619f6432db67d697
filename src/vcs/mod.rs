//! Version control adapters for releasing.
//!
//! Releasing needs very little from a VCS: prove the working tree is
//! clean, name the current revision, list changes since an older
//! revision, and tag. [`ReleaseVcs`] captures exactly that; [`GitVcs`]
//! is the git implementation.

pub mod git;

pub use git::GitVcs;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error from a version control operation.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("not a git repository (or any parent): {}", .path.display())]
    NotARepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("bare repository has no working tree: {}", .path.display())]
    BareRepository { path: PathBuf },

    #[error("repository has uncommitted changes ({count} paths, e.g. `{example}`)")]
    DirtyWorkTree { count: usize, example: String },

    #[error("repository has no commits yet")]
    EmptyHistory,

    #[error("tag `{name}` already exists")]
    TagExists { name: String },

    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// The version control operations a release depends on.
pub trait ReleaseVcs {
    /// Root of the working tree this adapter is bound to.
    fn root(&self) -> &Path;

    /// Fail if the repository is not in a releasable state. For git that
    /// means no uncommitted changes, untracked files included.
    fn validate_repository_state(&self) -> Result<(), VcsError>;

    /// Identifier of the current revision (full commit id for git).
    fn current_revision(&self) -> Result<String, VcsError>;

    /// Human-readable change entries from `revision` (exclusive) to the
    /// current revision, newest first. `None` means the full history.
    fn changelog_since(&self, revision: Option<&str>) -> Result<Vec<String>, VcsError>;

    /// Tag the current revision. The tag marks a completed release; it
    /// must not already exist.
    fn create_tag(&self, name: &str, message: &str) -> Result<(), VcsError>;
}
