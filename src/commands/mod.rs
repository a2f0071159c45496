//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `local-build`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` (and the global
//!   options) and performs the command's logic.
//!
//! The `execute` function is the main entry point for the command and is
//! responsible for orchestrating the necessary operations, calling into the
//! `local_build` library to perform the core logic.

pub mod apps;
pub mod build;
pub mod clean;
pub mod completions;
pub mod dir;
pub mod mounts;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use local_build::config::LocalConfig;
use local_build::defaults;
use local_build::locator::Application;
use local_build::output::OutputConfig;
use local_build::{suggestions, Error};

/// Options shared by every subcommand
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub color: String,
    pub config: Option<PathBuf>,
    pub project: Option<PathBuf>,
}

impl GlobalOptions {
    /// The project root: `--project`, else the current directory
    pub fn project_root(&self) -> Result<PathBuf> {
        match &self.project {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to get current directory"),
        }
    }

    /// Load the layered configuration for `project_root`.
    ///
    /// An explicitly given configuration file must exist; the default one
    /// is optional.
    pub fn load_config(&self, project_root: &Path) -> Result<LocalConfig> {
        let user_config = match &self.config {
            Some(path) => {
                if !path.is_file() {
                    return Err(suggestions::config_not_found(path));
                }
                path.clone()
            }
            None => defaults::default_user_config_path(),
        };
        LocalConfig::load(Some(user_config.as_path()), project_root)
            .map_err(|e| user_error(e, project_root))
    }

    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }
}

/// Translate a library error into a user-facing one with hints
pub fn user_error(error: Error, project_root: &Path) -> anyhow::Error {
    match error {
        Error::NoApplicationsFound { .. } => {
            suggestions::no_applications(project_root, defaults::DEFAULT_APP_CONFIG_FILE)
        }
        Error::MountNotFound { path, available } => {
            suggestions::mount_not_found(&path, &available)
        }
        other => anyhow::Error::new(other),
    }
}

/// Find the application `id`, or the only application when `id` is None
pub fn find_application(
    applications: Vec<Application>,
    id: Option<&str>,
    project_root: &Path,
) -> Result<Application> {
    let available: Vec<String> = applications.iter().map(|a| a.id().to_string()).collect();
    let found = match id {
        Some(id) => applications.into_iter().find(|app| app.id() == id),
        None if applications.len() == 1 => applications.into_iter().next(),
        None if applications.is_empty() => {
            return Err(suggestions::no_applications(
                project_root,
                defaults::DEFAULT_APP_CONFIG_FILE,
            ))
        }
        None => {
            anyhow::bail!(
                "The project has several applications: {}\n\nhint: Pick one with --app",
                available.join(", ")
            )
        }
    };
    found.ok_or_else(|| {
        let candidates: Vec<&str> = available.iter().map(String::as_str).collect();
        suggestions::unknown_application(id.unwrap_or_default(), &candidates)
    })
}
