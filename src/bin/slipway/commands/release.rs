//! `slipway release` command

use anyhow::{bail, Context, Result};

use crate::cli::ReleaseArgs;
use slipway::ops::slipway_release::{release, ReleaseOptions};

pub fn execute(args: ReleaseArgs) -> Result<()> {
    let working_dir =
        std::env::current_dir().context("failed to determine the current directory")?;
    let config = super::load_effective_config(&working_dir);

    let opts = ReleaseOptions {
        message: args.message,
        install_path: args.install_path,
    };

    let released = release(&working_dir, &config, &opts)?;
    if !released {
        bail!("release aborted: the build did not pass");
    }

    Ok(())
}
