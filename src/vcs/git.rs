//! Git implementation of the release VCS contract.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, ObjectType, Oid, Repository, StatusOptions};
use tracing::warn;

use crate::vcs::{ReleaseVcs, VcsError};

/// Release adapter over a git working tree.
pub struct GitVcs {
    repo: Repository,
    root: PathBuf,
}

impl std::fmt::Debug for GitVcs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitVcs")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GitVcs {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self, VcsError> {
        let repo = Repository::discover(path).map_err(|source| VcsError::NotARepository {
            path: path.to_path_buf(),
            source,
        })?;

        let root = repo
            .workdir()
            .ok_or_else(|| VcsError::BareRepository {
                path: path.to_path_buf(),
            })?
            .to_path_buf();

        Ok(GitVcs { repo, root })
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>, VcsError> {
        let head = self.repo.head().map_err(map_head_error)?;
        head.peel_to_commit().map_err(map_head_error)
    }
}

impl ReleaseVcs for GitVcs {
    fn root(&self) -> &Path {
        &self.root
    }

    fn validate_repository_state(&self) -> Result<(), VcsError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        if !statuses.is_empty() {
            let example = statuses
                .iter()
                .next()
                .and_then(|entry| entry.path().map(String::from))
                .unwrap_or_else(|| "<non-utf8 path>".to_string());
            return Err(VcsError::DirtyWorkTree {
                count: statuses.len(),
                example,
            });
        }
        Ok(())
    }

    fn current_revision(&self) -> Result<String, VcsError> {
        Ok(self.head_commit()?.id().to_string())
    }

    fn changelog_since(&self, revision: Option<&str>) -> Result<Vec<String>, VcsError> {
        let mut walk = self.repo.revwalk()?;
        walk.push_head().map_err(map_head_error)?;

        if let Some(rev) = revision {
            // A previous revision the repository no longer knows (e.g.
            // after a history rewrite) degrades to the full history.
            let known = Oid::from_str(rev)
                .ok()
                .filter(|oid| self.repo.find_commit(*oid).is_ok());
            match known {
                Some(oid) => walk.hide(oid)?,
                None => warn!(
                    "previous release revision {} not found in history; \
                     changelog will span the full history",
                    rev
                ),
            }
        }

        let mut entries = Vec::new();
        for oid in walk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let id = oid.to_string();
            entries.push(format!(
                "{} {}",
                &id[..7],
                commit.summary().unwrap_or("<no summary>")
            ));
        }
        Ok(entries)
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<(), VcsError> {
        let head = self
            .repo
            .head()
            .map_err(map_head_error)?
            .peel(ObjectType::Commit)
            .map_err(map_head_error)?;
        let signature = self.repo.signature()?;

        self.repo
            .tag(name, &head, &signature, message, false)
            .map_err(|err| {
                if err.code() == ErrorCode::Exists {
                    VcsError::TagExists {
                        name: name.to_string(),
                    }
                } else {
                    VcsError::Git(err)
                }
            })?;
        Ok(())
    }
}

fn map_head_error(err: git2::Error) -> VcsError {
    match err.code() {
        ErrorCode::UnbornBranch | ErrorCode::NotFound => VcsError::EmptyHistory,
        _ => VcsError::Git(err),
    }
}
