//! Implementation of the phases of a local build.
//!
//! ## Overview
//!
//! A build runs the following phases:
//! 1. Discovery - Find the applications of the repository and pick the ones to build
//! 2. Staging - Copy each application into its private build directory and
//!    record build metadata
//! 3. Install - Global dependencies, the flavor's install sequence and the
//!    descriptor's build hook
//! 4. Publish - Link shared file mounts and publish the web root
//!
//! Phases 2-4 run per application. A failing application gets a failed
//! [`BuildResult`] and the remaining applications are still built, unless
//! the run stops on the first failure.
//!
//! Each phase depends only on the previous phases and the foundation layers.

use std::fmt;
use std::path::PathBuf;

use crate::error::Error;

pub mod discovery;
pub mod install;
pub mod orchestrator;
pub mod publish;
pub mod staging;

pub use orchestrator::Orchestrator;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A message produced while building one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Which step of an application build failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Staging,
    DependencyInstall,
    BuildHook,
    Publish,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Staging => "staging",
            FailureKind::DependencyInstall => "dependency installation",
            FailureKind::BuildHook => "build hook",
            FailureKind::Publish => "publish",
            FailureKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Why an application build failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    /// Classify an error raised during a phase whose failures are `phase`.
    ///
    /// Errors that name their own kind keep it.
    pub fn from_error(phase: FailureKind, error: &Error) -> Self {
        let kind = match error {
            Error::Cancelled { .. } => FailureKind::Cancelled,
            Error::DependencyInstall { .. } => FailureKind::DependencyInstall,
            Error::BuildHook { .. } => FailureKind::BuildHook,
            Error::Publish { .. } => FailureKind::Publish,
            Error::Staging { .. } => FailureKind::Staging,
            _ => phase,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.kind, self.message)
    }
}

/// The outcome of building one application
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub app_id: String,
    /// Application source root
    pub root: PathBuf,
    /// Private build directory
    pub build_dir: PathBuf,
    /// Name of the flavor that built it
    pub flavor: String,
    pub success: bool,
    /// Where the web root was published, if anything was
    pub web_root: Option<PathBuf>,
    pub failure: Option<Failure>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildResult {
    /// Warning diagnostics only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == Level::Warning)
    }
}

/// The outcome of a whole build run
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// One result per application, in discovery order
    pub results: Vec<BuildResult>,
    /// Whether every application built
    pub success: bool,
}

impl BuildReport {
    pub fn new(results: Vec<BuildResult>) -> Self {
        let success = results.iter().all(|r| r.success);
        Self { results, success }
    }

    pub fn get(&self, app_id: &str) -> Option<&BuildResult> {
        self.results.iter().find(|r| r.app_id == app_id)
    }

    pub fn failed(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
