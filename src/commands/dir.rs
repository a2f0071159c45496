//! # Dir Command Implementation
//!
//! This module implements the `dir` subcommand, which prints the local
//! directories of the project so scripts can `cd` into them.
//!
//! ## Example
//!
//! ```bash
//! cd "$(local-build dir builds)"
//! ```

use anyhow::Result;
use clap::Args;

use local_build::suggestions;

use super::GlobalOptions;

/// Print the path of a local directory
#[derive(Args, Debug)]
pub struct DirArgs {
    /// Directory to print: builds, local, shared, web or web_root.
    ///
    /// Without it, every directory is listed.
    #[arg(value_name = "SUBDIR")]
    pub subdir: Option<String>,
}

/// Execute the `dir` command.
pub fn execute(args: DirArgs, global: &GlobalOptions) -> Result<()> {
    let project_root = global.project_root()?;
    let config = global.load_config(&project_root)?;
    let dirs = config.sub_dirs(&project_root);

    match args.subdir {
        Some(name) => match dirs.get(name.as_str()) {
            Some(path) => println!("{}", path.display()),
            None => {
                let names: Vec<&str> = dirs.keys().copied().collect();
                return Err(suggestions::unknown_subdir(&name, &names));
            }
        },
        None => {
            for (name, path) in &dirs {
                println!("{}\t{}", name, path.display());
            }
        }
    }
    Ok(())
}
