//! # Local Build CLI
//!
//! Binary entry point of `local-build`. Arguments are parsed by [`cli::Cli`]
//! and handed to the matching command in [`commands`]; everything else lives
//! in the `local_build` library. Errors returned from a command are printed
//! with their hints and turn into a non-zero exit status.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
