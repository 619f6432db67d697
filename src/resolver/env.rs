//! Resolved environments and their on-disk form.
//!
//! A [`ResolvedEnvironment`] is what a resolver hands back for a list of
//! requirements: the concrete packages a build runs against. It is
//! persisted per build unit as `env.lock` so that repeat builds (and the
//! install pass of a release) reuse the exact environment of the first
//! resolve rather than re-resolving against a world that may have moved.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::Requirement;
use crate::util::fs as futil;

/// Name of the per-unit cached environment file.
pub const ENV_FILE: &str = "env.lock";

/// A concrete dependency environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEnvironment {
    /// Requirement tokens the resolve was asked for, in request order
    pub requested: Vec<String>,

    /// Digest of `requested`; lets a later load detect that the package's
    /// requirements changed after this environment was cached
    pub request_digest: String,

    /// When the resolve happened, in milliseconds since the epoch
    pub timestamp_ms: u64,

    /// Resolved packages, in request order
    #[serde(rename = "package", default)]
    pub packages: Vec<ResolvedPackage>,
}

/// One package in a resolved environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: Version,
    /// Installed root of this package version
    pub root: PathBuf,
}

impl ResolvedEnvironment {
    pub fn new(
        requirements: &[Requirement],
        packages: Vec<ResolvedPackage>,
        timestamp_ms: u64,
    ) -> Self {
        ResolvedEnvironment {
            requested: requirements.iter().map(|r| r.as_str().to_string()).collect(),
            request_digest: request_digest(requirements),
            timestamp_ms,
            packages,
        }
    }

    /// Load a cached environment from a path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read environment file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("failed to parse environment file: {}", path.display()))
    }

    /// Save the environment to a path, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        let with_header = format!(
            "# This file is automatically generated by Slipway.\n\
             # It is not intended for manual editing.\n\n\
             {content}"
        );

        futil::write_string(path, &with_header)
            .with_context(|| format!("failed to write environment file: {}", path.display()))
    }

    /// Whether this environment was resolved for the given requirements.
    pub fn matches_request(&self, requirements: &[Requirement]) -> bool {
        self.request_digest == request_digest(requirements)
    }

    /// The `SLIPWAY_PKG_*` variables describing each resolved package.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = Vec::with_capacity(self.packages.len() * 2);
        for package in &self.packages {
            let key = env_key(&package.name);
            vars.push((
                format!("SLIPWAY_PKG_{key}_ROOT"),
                package.root.display().to_string(),
            ));
            vars.push((
                format!("SLIPWAY_PKG_{key}_VERSION"),
                package.version.to_string(),
            ));
        }
        vars
    }

    /// `bin/` directories of the resolved packages, for PATH composition.
    pub fn bin_paths(&self) -> Vec<PathBuf> {
        self.packages.iter().map(|p| p.root.join("bin")).collect()
    }

    /// Render a POSIX shell script that activates this environment and
    /// either runs its arguments or drops into a shell.
    pub fn activation_script(&self) -> String {
        let mut script = String::new();
        script.push_str("#!/bin/sh\n");
        script.push_str(&format!(
            "# Generated by Slipway. Build environment for: {}\n",
            self.requested.join(" ")
        ));
        for (key, value) in self.env_vars() {
            script.push_str(&format!("export {key}='{value}'\n"));
        }
        let bins: Vec<String> = self
            .bin_paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        if !bins.is_empty() {
            script.push_str(&format!("export PATH='{}':\"$PATH\"\n", bins.join(":")));
        }
        script.push_str(
            "if [ $# -gt 0 ]; then\n    exec \"$@\"\nelse\n    exec \"${SHELL:-/bin/sh}\"\nfi\n",
        );
        script
    }

    /// Write the activation script to a path and mark it executable.
    pub fn write_activation_script(&self, path: &Path) -> Result<()> {
        futil::write_string(path, &self.activation_script())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
                .with_context(|| format!("failed to mark {} executable", path.display()))?;
        }

        Ok(())
    }
}

/// Digest of a requirement list, as stored in `env.lock`.
pub fn request_digest(requirements: &[Requirement]) -> String {
    let mut hasher = Sha256::new();
    for req in requirements {
        hasher.update(req.as_str().as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn requirements(tokens: &[&str]) -> Vec<Requirement> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn sample_env() -> ResolvedEnvironment {
        ResolvedEnvironment::new(
            &requirements(&["bar-1.2", "python"]),
            vec![
                ResolvedPackage {
                    name: "bar".to_string(),
                    version: Version::new(1, 2, 3),
                    root: PathBuf::from("/pkgs/bar/1.2.3"),
                },
                ResolvedPackage {
                    name: "python".to_string(),
                    version: Version::new(3, 11, 0),
                    root: PathBuf::from("/pkgs/python/3.11.0"),
                },
            ],
            1_700_000_000_123,
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("unit").join(ENV_FILE);

        let env = sample_env();
        env.save(&path).unwrap();

        let loaded = ResolvedEnvironment::load(&path).unwrap();
        assert_eq!(loaded, env);
        assert_eq!(loaded.timestamp_ms, 1_700_000_000_123);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("# This file is automatically generated"));
    }

    #[test]
    fn test_request_digest_tracks_request() {
        let env = sample_env();
        assert!(env.matches_request(&requirements(&["bar-1.2", "python"])));
        assert!(!env.matches_request(&requirements(&["bar-1.3", "python"])));
        assert!(!env.matches_request(&requirements(&["python", "bar-1.2"])));
    }

    #[test]
    fn test_env_vars() {
        let env = sample_env();
        let vars = env.env_vars();
        assert!(vars.contains(&(
            "SLIPWAY_PKG_BAR_ROOT".to_string(),
            "/pkgs/bar/1.2.3".to_string()
        )));
        assert!(vars.contains(&(
            "SLIPWAY_PKG_PYTHON_VERSION".to_string(),
            "3.11.0".to_string()
        )));
    }

    #[test]
    fn test_env_key_sanitizes_names() {
        assert_eq!(env_key("my_pkg"), "MY_PKG");
        assert_eq!(env_key("lib.core"), "LIB_CORE");
    }

    #[test]
    fn test_activation_script() {
        let script = sample_env().activation_script();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("export SLIPWAY_PKG_BAR_ROOT='/pkgs/bar/1.2.3'"));
        assert!(script.contains("export PATH='/pkgs/bar/1.2.3/bin:/pkgs/python/3.11.0/bin':\"$PATH\""));
        assert!(script.contains("exec \"$@\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_activation_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("build-env.sh");
        sample_env().write_activation_script(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
