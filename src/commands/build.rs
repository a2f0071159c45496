//! # Build Command Implementation
//!
//! This module implements the `build` subcommand, the main entry point of
//! the tool. It discovers the applications of the project, builds each one
//! with its flavor, and publishes the results under the local web root.
//!
//! ## Process
//!
//! 1.  **Load Configuration**: Layers the user configuration file and the
//!     project overrides over the built-in defaults.
//! 2.  **Build**: Hands the project to the [`Orchestrator`], which stages,
//!     installs and publishes every selected application.
//! 3.  **Report**: Prints the outcome of each application and a summary.
//!
//! A failing application does not stop its siblings (unless
//! `--stop-on-failure` is given), but the command exits with a non-zero
//! status if any application failed.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use local_build::config::BuildSettings;
use local_build::flavor::FlavorRegistry;
use local_build::output::{format_result, format_summary};
use local_build::process::SystemRunner;
use local_build::Orchestrator;

use super::{user_error, GlobalOptions};

/// Build the applications of the project
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Only build this application (repeatable).
    #[arg(long = "app", value_name = "ID")]
    pub apps: Vec<String>,

    /// Reuse existing build directories instead of starting from scratch.
    #[arg(long)]
    pub no_clean: bool,

    /// Copy the web root instead of symlinking it.
    #[arg(long)]
    pub copy: bool,

    /// Use absolute symlinks.
    #[arg(long)]
    pub abslinks: bool,

    /// Skip global and flavor dependency installation.
    #[arg(long)]
    pub no_deps: bool,

    /// Skip the build hook.
    #[arg(long)]
    pub no_build_hooks: bool,

    /// Resolve dependencies freshly, ignoring lock files.
    #[arg(long, conflicts_with = "require_lock")]
    pub ignore_lock: bool,

    /// Fail when a dependency lock file is missing.
    #[arg(long)]
    pub require_lock: bool,

    /// Stop at the first failing application.
    #[arg(long)]
    pub stop_on_failure: bool,

    /// Fail when no application descriptor is found.
    #[arg(long)]
    pub require_applications: bool,

    /// Number of applications to build concurrently.
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Kill any build command running longer than this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl From<BuildArgs> for BuildSettings {
    fn from(args: BuildArgs) -> Self {
        BuildSettings {
            no_clean: args.no_clean,
            copy: args.copy,
            abslinks: args.abslinks,
            no_deps: args.no_deps,
            no_build_hooks: args.no_build_hooks,
            ignore_lock: args.ignore_lock,
            require_lock: args.require_lock,
            stop_on_failure: args.stop_on_failure,
            require_applications: args.require_applications,
            jobs: args.jobs.max(1),
            timeout: args.timeout,
            only: args.apps,
        }
    }
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, global: &GlobalOptions) -> Result<()> {
    let project_root = global.project_root()?;
    let config = global.load_config(&project_root)?;
    let output = global.output();
    let settings = BuildSettings::from(args);

    let orchestrator = Orchestrator::new(
        config,
        FlavorRegistry::with_defaults(),
        Arc::new(SystemRunner::new()),
    );

    let spinner = output.spinner("Building applications...");
    let outcome = orchestrator.build(&project_root, &settings);
    spinner.finish_and_clear();

    let report = outcome.map_err(|e| user_error(e, &project_root))?;
    for result in &report.results {
        println!("{}", format_result(&output, result));
    }
    println!("{}", format_summary(&output, &report));

    if !report.success {
        let failed: Vec<&str> = report.failed().map(|r| r.app_id.as_str()).collect();
        anyhow::bail!("Build failed for: {}", failed.join(", "));
    }
    Ok(())
}
