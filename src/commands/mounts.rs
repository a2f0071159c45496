//! # Mounts Command Implementation
//!
//! This module implements the `mounts` subcommand, which shows the mounts
//! an application declares, resolves a user-supplied mount path against
//! them, or lists where shared file mounts are stored locally.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use local_build::flavor::FlavorRegistry;
use local_build::mounts::{self, Mounts};
use local_build::process::SystemRunner;
use local_build::Orchestrator;

use super::{find_application, user_error, GlobalOptions};

/// Show the mounts of an application
#[derive(Args, Debug)]
pub struct MountsArgs {
    /// Application id; may be omitted when the project has one application.
    #[arg(long = "app", value_name = "ID")]
    pub app: Option<String>,

    /// Print the declared mount matching this path.
    #[arg(long = "match", value_name = "PATH", conflicts_with = "shared")]
    pub match_path: Option<String>,

    /// Only list shared file mounts with their local storage.
    #[arg(long)]
    pub shared: bool,
}

/// Execute the `mounts` command.
pub fn execute(args: MountsArgs, global: &GlobalOptions) -> Result<()> {
    let project_root = global.project_root()?;
    let config = global.load_config(&project_root)?;
    let orchestrator = Orchestrator::new(
        config,
        FlavorRegistry::with_defaults(),
        Arc::new(SystemRunner::new()),
    );

    let applications = orchestrator
        .locate(&project_root)
        .map_err(|e| user_error(e, &project_root))?;
    let app = find_application(applications.clone(), args.app.as_deref(), &project_root)?;
    let declared = app.mounts().map_err(|e| user_error(e, &project_root))?;

    if let Some(partial) = args.match_path {
        let matched =
            mounts::match_path(&partial, &declared).map_err(|e| user_error(e, &project_root))?;
        println!("{}", matched);
        return Ok(());
    }

    if args.shared {
        let canonical_root = std::fs::canonicalize(&project_root)?;
        let storage = orchestrator.shared_dir(&canonical_root, &applications, &app);
        for line in shared_lines(&declared, &storage) {
            println!("{}", line);
        }
        return Ok(());
    }

    if declared.is_empty() {
        println!("No mounts declared for {}", app.id());
    }
    for (path, definition) in &declared {
        println!("{}\t{}", path, definition.describe());
    }
    Ok(())
}

fn shared_lines(declared: &Mounts, storage: &Path) -> Vec<String> {
    mounts::shared_file_mounts(declared)
        .into_iter()
        .map(|(path, source)| format!("{}\t{}", path, storage.join(source).display()))
        .collect()
}
