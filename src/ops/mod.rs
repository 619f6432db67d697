//! High-level operations.
//!
//! This module contains the implementation of Slipway commands.

pub mod slipway_build;
pub mod slipway_release;

pub use slipway_build::{build, render_plan, BuildOptions};
pub use slipway_release::{release, ReleaseOptions};
