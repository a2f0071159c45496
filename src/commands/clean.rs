//! # Clean Command Implementation
//!
//! This module implements the `clean` subcommand, which removes build
//! output: the build and dependency directories of the selected
//! applications and, with `--all`, the published web root and shared file
//! storage too.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use local_build::flavor::FlavorRegistry;
use local_build::output::emoji;
use local_build::process::SystemRunner;
use local_build::Orchestrator;

use super::{user_error, GlobalOptions};

/// Remove build output
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Only clean this application (repeatable).
    #[arg(long = "app", value_name = "ID")]
    pub apps: Vec<String>,

    /// Also remove the web root and shared file storage.
    #[arg(long, conflicts_with = "apps")]
    pub all: bool,
}

/// Execute the `clean` command.
pub fn execute(args: CleanArgs, global: &GlobalOptions) -> Result<()> {
    let project_root = global.project_root()?;
    let config = global.load_config(&project_root)?;
    let output = global.output();

    let orchestrator = Orchestrator::new(
        config,
        FlavorRegistry::with_defaults(),
        Arc::new(SystemRunner::new()),
    );
    let removed = orchestrator
        .clean(&project_root, &args.apps, args.all)
        .map_err(|e| user_error(e, &project_root))?;

    if removed.is_empty() {
        println!("Nothing to clean");
    } else {
        for path in &removed {
            println!("{} Removed {}", emoji(&output, "🧹", "-"), path.display());
        }
    }
    Ok(())
}
