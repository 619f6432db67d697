//! package.toml parsing and schema.
//!
//! The package descriptor is the authored description of a package: its
//! identity, its requirements, its build variants, and how to build it.
//! Descriptors are immutable once loaded; everything downstream works
//! from the parsed value.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::requirement::{is_valid_name, Requirement};

/// Name of the package descriptor file.
pub const DESCRIPTOR_FILE: &str = "package.toml";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("no {DESCRIPTOR_FILE} found in {}", dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid package description in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// The parsed package.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Package identity and requirements
    pub package: PackageSection,

    /// How to build the package
    #[serde(default)]
    pub build: BuildSettings,
}

/// The `[package]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name; `-` is not allowed (it separates name from range in
    /// requirement tokens)
    pub name: String,

    /// Package version; absent for packages not yet ready to release
    #[serde(default)]
    pub version: Option<Version>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    /// Runtime requirements, in declared order
    #[serde(default)]
    pub requires: Vec<Requirement>,

    /// Build-time-only requirements, in declared order
    #[serde(default)]
    pub build_requires: Vec<Requirement>,

    /// Build variants: each entry is an ordered list of requirement
    /// tokens appended to the base requirements
    #[serde(default)]
    pub variants: Vec<Vec<Requirement>>,
}

/// The `[build]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Command run in the unit build directory
    pub command: String,

    /// Files the build produces, relative to the build directory; these
    /// are what an installing build copies into the install tree
    pub artifacts: Vec<PathBuf>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            command: "./build.sh".to_string(),
            artifacts: Vec::new(),
        }
    }
}

impl PackageDescriptor {
    /// Parse descriptor content. `path` is used for error reporting only.
    pub fn parse(content: &str, path: &Path) -> Result<Self, MetadataError> {
        let descriptor: PackageDescriptor =
            toml::from_str(content).map_err(|source| MetadataError::Parse {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?;
        descriptor.validate(path)?;
        Ok(descriptor)
    }

    fn validate(&self, path: &Path) -> Result<(), MetadataError> {
        let invalid = |reason: String| MetadataError::Invalid {
            path: path.to_path_buf(),
            reason,
        };

        if !is_valid_name(&self.package.name) {
            return Err(invalid(format!(
                "invalid package name `{}`",
                self.package.name
            )));
        }

        for (index, variant) in self.package.variants.iter().enumerate() {
            if variant.is_empty() {
                return Err(invalid(format!("variant {} is empty", index)));
            }
            if self.package.variants[..index].contains(variant) {
                return Err(invalid(format!(
                    "variant {} duplicates an earlier variant",
                    index
                )));
            }
        }

        for artifact in &self.build.artifacts {
            let escapes = artifact.is_absolute()
                || artifact
                    .components()
                    .any(|c| matches!(c, std::path::Component::ParentDir));
            if escapes {
                return Err(invalid(format!(
                    "artifact `{}` must be a relative path inside the build directory",
                    artifact.display()
                )));
            }
        }

        Ok(())
    }

    /// `name-version`, or just the name for unversioned packages.
    pub fn qualified_name(&self) -> String {
        match &self.package.version {
            Some(version) => format!("{}-{}", self.package.name, version),
            None => self.package.name.clone(),
        }
    }

    /// Path of this package under an install root: `name/version`, or
    /// just `name` for unversioned packages.
    pub fn install_subpath(&self) -> PathBuf {
        match &self.package.version {
            Some(version) => Path::new(&self.package.name).join(version.to_string()),
            None => PathBuf::from(&self.package.name),
        }
    }
}

/// Load the package descriptor from a working directory.
///
/// Returns the descriptor together with the path of the file it was
/// loaded from.
pub fn load_package_descriptor(
    working_dir: &Path,
) -> Result<(PackageDescriptor, PathBuf), MetadataError> {
    let path = working_dir.join(DESCRIPTOR_FILE);
    if !path.exists() {
        return Err(MetadataError::NotFound {
            dir: working_dir.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| MetadataError::Io {
        path: path.clone(),
        source,
    })?;

    let descriptor = PackageDescriptor::parse(&contents, &path)?;
    Ok((descriptor, path))
}
