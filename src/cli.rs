//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Local Build - Build the applications of a project for local serving
#[derive(Parser, Debug)]
#[command(name = "local-build")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// User configuration file.
    ///
    /// Defaults to `config.yaml` in the platform configuration directory
    /// (e.g., `~/.config/local-build/config.yaml` on Linux).
    #[arg(long, global = true, value_name = "FILE", env = "LOCAL_BUILD_CONFIG")]
    config: Option<PathBuf>,

    /// Project root directory.
    ///
    /// If not provided, it defaults to the current working directory.
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the applications of the project
    Build(commands::build::BuildArgs),

    /// List the applications of the project
    Apps(commands::apps::AppsArgs),

    /// Show the mounts of an application
    Mounts(commands::mounts::MountsArgs),

    /// Print the path of a local directory (builds, shared, web root)
    Dir(commands::dir::DirArgs),

    /// Remove build output
    Clean(commands::clean::CleanArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let global = commands::GlobalOptions {
            color: self.color,
            config: self.config,
            project: self.project,
        };

        match self.command {
            Commands::Build(args) => commands::build::execute(args, &global),
            Commands::Apps(args) => commands::apps::execute(args, &global),
            Commands::Mounts(args) => commands::mounts::execute(args, &global),
            Commands::Dir(args) => commands::dir::execute(args, &global),
            Commands::Clean(args) => commands::clean::execute(args, &global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level.to_lowercase());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
