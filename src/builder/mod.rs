//! Build and release machinery.
//!
//! This module turns a package descriptor into build units, resolves and
//! caches a dependency environment per unit, drives the build backend
//! over every unit and wraps the whole thing in the release protocol.

pub mod backend;
pub mod env_cache;
pub mod orchestrator;
pub mod plan;
pub mod release;

pub use backend::{BackendRequest, BuildBackend, BuildOutcome, CommandBackend, ENV_SCRIPT_FILE};
pub use env_cache::EnvironmentCache;
pub use orchestrator::{BuildOrchestrator, BuildReport, ExecutionStrategy, UnitFailure};
pub use plan::{plan_builds, BuildUnit};
pub use release::{
    ReleaseCoordinator, ReleaseError, ReleaseRecord, RELEASE_RECORD_FILE,
};
