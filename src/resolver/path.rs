//! Search-path based resolution.
//!
//! [`PathResolver`] resolves requirements against explicit lists of
//! installed-package roots laid out as `<root>/<name>/<version>/`. It is
//! non-transitive: it satisfies exactly the requirements it is handed,
//! picking per name the highest installed version that satisfies every
//! range requested for that name. A full dependency solver slots in
//! behind the same [`Resolver`] trait.

use std::path::{Path, PathBuf};

use semver::Version;
use tracing::debug;

use crate::core::{Requirement, DESCRIPTOR_FILE};
use crate::resolver::env::{ResolvedEnvironment, ResolvedPackage};
use crate::resolver::errors::ResolveError;
use crate::resolver::Resolver;

/// Resolves against an ordered list of package roots.
///
/// Earlier roots shadow later ones: if the same version of a package is
/// installed under two roots, the first root's copy is used.
#[derive(Debug, Clone)]
pub struct PathResolver {
    search_paths: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        PathResolver { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// All installed versions of `name`, with the root each was found
    /// under. A version directory only counts if it holds a descriptor;
    /// anything else is treated as a partial install and skipped.
    pub fn installed_versions(&self, name: &str) -> Vec<(Version, PathBuf)> {
        let mut found: Vec<(Version, PathBuf)> = Vec::new();
        for root in &self.search_paths {
            let package_dir = root.join(name);
            let entries = match std::fs::read_dir(&package_dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let Ok(version) = dir_name.parse::<Version>() else {
                    debug!(
                        "ignoring non-version directory {} under {}",
                        dir_name,
                        package_dir.display()
                    );
                    continue;
                };
                if !path.join(DESCRIPTOR_FILE).exists() {
                    debug!("ignoring {} (no {})", path.display(), DESCRIPTOR_FILE);
                    continue;
                }
                if found.iter().any(|(existing, _)| *existing == version) {
                    continue;
                }
                found.push((version, path));
            }
        }
        found
    }
}

impl Resolver for PathResolver {
    fn resolve(
        &self,
        requirements: &[Requirement],
        timestamp_ms: u64,
    ) -> Result<ResolvedEnvironment, ResolveError> {
        // Group requirements by name, preserving first-request order. A
        // name requested twice must satisfy both ranges at once.
        let mut grouped: Vec<(&str, Vec<&Requirement>)> = Vec::new();
        for req in requirements {
            match grouped.iter_mut().find(|(name, _)| *name == req.name()) {
                Some((_, reqs)) => reqs.push(req),
                None => grouped.push((req.name(), vec![req])),
            }
        }

        let mut packages = Vec::with_capacity(grouped.len());
        for (name, reqs) in grouped {
            let mut candidates = self.installed_versions(name);
            if candidates.is_empty() {
                return Err(ResolveError::PackageNotFound {
                    name: name.to_string(),
                    searched: self.search_paths.clone(),
                });
            }

            candidates.sort_by(|a, b| b.0.cmp(&a.0));
            let chosen = candidates
                .iter()
                .find(|(version, _)| reqs.iter().all(|req| req.matches(version)));

            match chosen {
                Some((version, root)) => {
                    debug!("resolved {} -> {} at {}", name, version, root.display());
                    packages.push(ResolvedPackage {
                        name: name.to_string(),
                        version: version.clone(),
                        root: root.clone(),
                    });
                }
                None => {
                    let requested = reqs
                        .iter()
                        .map(|r| r.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    let mut available: Vec<Version> =
                        candidates.into_iter().map(|(v, _)| v).collect();
                    available.sort();
                    return Err(ResolveError::NoSatisfyingVersion {
                        name: name.to_string(),
                        requested,
                        available,
                    });
                }
            }
        }

        Ok(ResolvedEnvironment::new(requirements, packages, timestamp_ms))
    }
}

#[cfg(test)]
pub(crate) fn install_fake_package(root: &Path, name: &str, version: &str) -> PathBuf {
    let dir = root.join(name).join(version);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(DESCRIPTOR_FILE),
        format!("[package]\nname = \"{name}\"\nversion = \"{version}\"\n"),
    )
    .unwrap();
    dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn requirements(tokens: &[&str]) -> Vec<Requirement> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn test_picks_highest_satisfying_version() {
        let tmp = TempDir::new().unwrap();
        install_fake_package(tmp.path(), "bar", "1.2.0");
        install_fake_package(tmp.path(), "bar", "1.9.1");
        install_fake_package(tmp.path(), "bar", "2.0.0");

        let resolver = PathResolver::new(vec![tmp.path().to_path_buf()]);
        let env = resolver.resolve(&requirements(&["bar-1.2"]), 1).unwrap();

        assert_eq!(env.packages.len(), 1);
        assert_eq!(env.packages[0].version, Version::new(1, 9, 1));
        assert_eq!(env.packages[0].root, tmp.path().join("bar/1.9.1"));
    }

    #[test]
    fn test_repeated_name_intersects_ranges() {
        let tmp = TempDir::new().unwrap();
        install_fake_package(tmp.path(), "bar", "1.2.0");
        install_fake_package(tmp.path(), "bar", "1.6.0");
        install_fake_package(tmp.path(), "bar", "1.9.0");

        let resolver = PathResolver::new(vec![tmp.path().to_path_buf()]);
        let env = resolver
            .resolve(&requirements(&["bar-1", "bar-<1.7"]), 1)
            .unwrap();

        // One entry, highest version satisfying both ranges
        assert_eq!(env.packages.len(), 1);
        assert_eq!(env.packages[0].version, Version::new(1, 6, 0));
    }

    #[test]
    fn test_earlier_search_path_shadows() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        install_fake_package(first.path(), "bar", "1.2.0");
        install_fake_package(second.path(), "bar", "1.2.0");

        let resolver = PathResolver::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let env = resolver.resolve(&requirements(&["bar"]), 1).unwrap();

        assert_eq!(env.packages[0].root, first.path().join("bar/1.2.0"));
    }

    #[test]
    fn test_later_path_still_contributes_other_versions() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        install_fake_package(first.path(), "bar", "1.2.0");
        install_fake_package(second.path(), "bar", "1.5.0");

        let resolver = PathResolver::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let env = resolver.resolve(&requirements(&["bar-1"]), 1).unwrap();

        assert_eq!(env.packages[0].version, Version::new(1, 5, 0));
        assert_eq!(env.packages[0].root, second.path().join("bar/1.5.0"));
    }

    #[test]
    fn test_package_not_found() {
        let tmp = TempDir::new().unwrap();
        let resolver = PathResolver::new(vec![tmp.path().to_path_buf()]);

        let err = resolver
            .resolve(&requirements(&["missing"]), 1)
            .unwrap_err();
        assert!(matches!(err, ResolveError::PackageNotFound { .. }));
    }

    #[test]
    fn test_no_satisfying_version_reports_available() {
        let tmp = TempDir::new().unwrap();
        install_fake_package(tmp.path(), "bar", "1.2.0");

        let resolver = PathResolver::new(vec![tmp.path().to_path_buf()]);
        let err = resolver.resolve(&requirements(&["bar-2"]), 1).unwrap_err();

        match err {
            ResolveError::NoSatisfyingVersion { available, .. } => {
                assert_eq!(available, vec![Version::new(1, 2, 0)]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ignores_incomplete_and_foreign_directories() {
        let tmp = TempDir::new().unwrap();
        install_fake_package(tmp.path(), "bar", "1.2.0");
        // Version dir without a descriptor: a partial install
        std::fs::create_dir_all(tmp.path().join("bar/9.9.9")).unwrap();
        // Not a version at all
        std::fs::create_dir_all(tmp.path().join("bar/latest")).unwrap();

        let resolver = PathResolver::new(vec![tmp.path().to_path_buf()]);
        let env = resolver.resolve(&requirements(&["bar"]), 1).unwrap();

        assert_eq!(env.packages[0].version, Version::new(1, 2, 0));
    }

    #[test]
    fn test_resolution_preserves_request_order() {
        let tmp = TempDir::new().unwrap();
        install_fake_package(tmp.path(), "zlib", "1.3.0");
        install_fake_package(tmp.path(), "bar", "1.2.0");

        let resolver = PathResolver::new(vec![tmp.path().to_path_buf()]);
        let env = resolver
            .resolve(&requirements(&["zlib", "bar-1.2"]), 42)
            .unwrap();

        let names: Vec<&str> = env.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zlib", "bar"]);
        assert_eq!(env.timestamp_ms, 42);
        assert_eq!(env.requested, vec!["zlib", "bar-1.2"]);
    }
}
