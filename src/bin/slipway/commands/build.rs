//! `slipway build` command

use anyhow::{bail, Context, Result};

use crate::cli::BuildArgs;
use slipway::ops::slipway_build::{build, render_plan, BuildOptions};

pub fn execute(args: BuildArgs) -> Result<()> {
    let working_dir =
        std::env::current_dir().context("failed to determine the current directory")?;

    if args.plan {
        println!("{}", render_plan(&working_dir)?);
        return Ok(());
    }

    let config = super::load_effective_config(&working_dir);

    let opts = BuildOptions {
        clean: args.clean,
        install: args.install,
        install_path: args.install_path,
        env_scripts: args.scripts,
    };

    let report = build(&working_dir, &config, &opts)?;

    if let Some(failure) = &report.failure {
        bail!("build failed: {}", failure.reason);
    }

    for script in &report.env_scripts {
        eprintln!("       Wrote {}", script.display());
    }
    eprintln!("    Finished {} unit(s)", report.units_attempted);

    Ok(())
}
