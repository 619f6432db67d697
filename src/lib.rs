//! Slipway - build and release orchestration for versioned packages
//!
//! This crate provides the core library functionality for Slipway,
//! including variant planning, environment caching, build orchestration
//! and the two-pass release protocol.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;
pub mod vcs;

/// Test utilities and mocks for Slipway unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations of the resolver,
/// build backend and VCS seams, plus git repository fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::builder::{
    plan_builds, BuildOrchestrator, BuildReport, BuildUnit, CommandBackend, ExecutionStrategy,
    ReleaseCoordinator,
};
pub use crate::core::{load_package_descriptor, PackageDescriptor, Requirement};
pub use crate::resolver::{PathResolver, ResolvedEnvironment, Resolver};
pub use crate::util::Config;
pub use crate::vcs::{GitVcs, ReleaseVcs};
