//! # Completions Command Implementation
//!
//! Generates shell completion scripts with `clap_complete`, to stdout or
//! straight into a file.
//!
//! ```bash
//! local-build completions bash > ~/.local/share/bash-completion/completions/local-build
//! local-build completions zsh --output ~/.zfunc/_local-build
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

const BIN_NAME: &str = "local-build";

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_completions(args.shell, &mut file)?;
            log::info!("Wrote {} completions to {}", args.shell, path.display());
        }
        None => write_completions(args.shell, &mut io::stdout())?,
    }
    Ok(())
}

fn write_completions<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, &mut *out);
    out.flush()?;
    Ok(())
}
