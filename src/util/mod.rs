//! Shared utilities

pub mod config;
pub mod fs;
pub mod fsname;

pub use config::Config;
