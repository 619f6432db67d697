//! Core data structures for Slipway.
//!
//! This module contains the foundational types used throughout Slipway:
//! - Requirement tokens (`name` / `name-RANGE`)
//! - Package descriptors (package.toml)

pub mod descriptor;
pub mod requirement;

pub use descriptor::{
    load_package_descriptor, BuildSettings, MetadataError, PackageDescriptor, DESCRIPTOR_FILE,
};
pub use requirement::{Requirement, RequirementError};
