//! Requirement resolution.
//!
//! The orchestration layer never resolves requirements itself; it asks a
//! [`Resolver`] and treats the result as opaque. The shipped
//! implementation is [`PathResolver`]; anything smarter (a real
//! dependency solver, a remote service) implements the same trait.

pub mod env;
pub mod errors;
pub mod path;

pub use env::{request_digest, ResolvedEnvironment, ResolvedPackage, ENV_FILE};
pub use errors::ResolveError;
pub use path::PathResolver;

use crate::core::Requirement;

/// Resolves a requirement list into a concrete environment.
pub trait Resolver {
    /// Resolve `requirements` into an environment stamped with
    /// `timestamp_ms`. Requirements arrive in request order and the
    /// returned environment preserves it.
    fn resolve(
        &self,
        requirements: &[Requirement],
        timestamp_ms: u64,
    ) -> Result<ResolvedEnvironment, ResolveError>;
}
