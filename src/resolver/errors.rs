//! Resolution error types.

use std::path::PathBuf;

use semver::Version;
use thiserror::Error;

/// Error during requirement resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("package not found: `{name}` (searched: {})", display_paths(.searched))]
    PackageNotFound { name: String, searched: Vec<PathBuf> },

    #[error(
        "no installed version of `{name}` satisfies `{requested}` (available: {})",
        display_versions(.available)
    )]
    NoSatisfyingVersion {
        name: String,
        requested: String,
        available: Vec<Version>,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no package paths configured".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_versions(versions: &[Version]) -> String {
    versions
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
