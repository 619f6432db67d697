//! Command implementations

use std::path::Path;

use slipway::util::config::{global_config_path, load_config, project_config_path};
use slipway::util::Config;

pub mod build;
pub mod completions;
pub mod release;

/// Merged global and project configuration for a working directory.
pub fn load_effective_config(working_dir: &Path) -> Config {
    let global = global_config_path().unwrap_or_default();
    load_config(&global, &project_config_path(working_dir))
}
