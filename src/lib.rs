//! # Local Build Library
//!
//! This library provides the core of the `local-build` command-line tool:
//! discovering the applications of a source tree, building each one with
//! the strategy matching its type, and arranging the results (web roots,
//! shared file mounts) so the project is runnable locally.
//!
//! ## Quick Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use local_build::config::{BuildSettings, LocalConfig};
//! use local_build::flavor::FlavorRegistry;
//! use local_build::phases::Orchestrator;
//! use local_build::process::SystemRunner;
//!
//! let root = Path::new("/path/to/project");
//! let config = LocalConfig::load(None, root).unwrap();
//! let orchestrator = Orchestrator::new(
//!     config,
//!     FlavorRegistry::with_defaults(),
//!     Arc::new(SystemRunner::new()),
//! );
//!
//! let report = orchestrator.build(root, &BuildSettings::default()).unwrap();
//! for result in &report.results {
//!     println!("{}: {}", result.app_id, result.success);
//! }
//! ```
//!
//! ## Core Concepts
//!
//! - **Descriptors (`descriptor`)**: The per-application YAML file
//!   (`.platform.app.yaml`) declaring type, flavor, web locations, mounts,
//!   dependencies and hooks.
//! - **Discovery (`locator`)**: Finds every application of a repository,
//!   including nested ones, and gives each a unique id.
//! - **Flavors (`flavor`)**: Ecosystem-specific build strategies (Composer,
//!   Symfony, Drupal, Node.js, pass-through) selected through an explicit
//!   registry.
//! - **Mounts (`mounts`)**: Normalization of mount tables, shared-storage
//!   queries and exact mount path matching.
//! - **Phases (`phases`)**: The build pipeline and its orchestrator.
//! - **Collaborators (`process`, `filesystem`)**: Subprocess execution behind
//!   a mockable trait, and disk helpers for copying, removing and publishing.
//!
//! ## Execution Flow
//!
//! The main entry point is [`phases::Orchestrator::build`], which executes:
//!
//! 1.  **Discovery**: Locate the applications (or the implicit root one).
//! 2.  **Staging**: Copy each application into its private build directory.
//! 3.  **Install**: Global dependencies, the flavor's install, the build hook.
//! 4.  **Publish**: Link shared mounts and publish the web root.
//!
//! A failing application never prevents its siblings from building; its
//! failure is recorded in its [`phases::BuildResult`].

pub mod config;
pub mod defaults;
pub mod descriptor;
pub mod error;
pub mod filesystem;
pub mod flavor;
pub mod locator;
pub mod mounts;
pub mod output;
pub mod path;
pub mod phases;
pub mod process;
pub mod suggestions;

#[cfg(test)]
mod path_proptest;

pub use error::{Error, Result};
pub use locator::{locate, Application};
pub use phases::{BuildReport, BuildResult, Orchestrator};

/// The mounts of an application, normalized
pub fn get_mounts(application: &Application) -> Result<mounts::Mounts> {
    application.mounts()
}

/// Match a user-supplied mount path against a mount table
pub fn match_mount_path(partial: &str, mounts: &mounts::Mounts) -> Result<String> {
    mounts::match_path(partial, mounts)
}
