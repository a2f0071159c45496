//! Per-application build state handed to a flavor

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{BuildSettings, LocalConfig};
use crate::error::{Error, Result};
use crate::locator::Application;
use crate::phases::{Diagnostic, Level};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};

/// Mutable state of one application build.
///
/// A context is owned by exactly one build and never shared between
/// concurrently building applications. Everything a flavor reports goes
/// through [`BuildContext::info`] / [`BuildContext::warn`], which both log
/// (prefixed with the application id) and buffer the message for the
/// application's [`crate::phases::BuildResult`].
pub struct BuildContext<'a> {
    app: &'a Application,
    build_dir: PathBuf,
    settings: &'a BuildSettings,
    config: &'a LocalConfig,
    runner: &'a dyn CommandRunner,
    path_prefix: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        app: &'a Application,
        build_dir: PathBuf,
        settings: &'a BuildSettings,
        config: &'a LocalConfig,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            app,
            build_dir,
            settings,
            config,
            runner,
            path_prefix: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn app(&self) -> &Application {
        self.app
    }

    pub fn app_id(&self) -> &str {
        self.app.id()
    }

    /// The private build directory of this application
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// The document root inside the build directory
    pub fn document_root(&self) -> Result<PathBuf> {
        let relative = self.app.descriptor().document_root();
        self.within_build_dir(&relative)
    }

    /// Join an application-relative path onto the build directory.
    ///
    /// Fails with a publish error when the path would leave it.
    pub fn within_build_dir(&self, relative: &str) -> Result<PathBuf> {
        crate::path::join_contained(&self.build_dir, relative).map_err(|message| Error::Publish {
            app: self.app.id().to_string(),
            path: self.build_dir.clone(),
            message,
        })
    }

    pub fn settings(&self) -> &BuildSettings {
        self.settings
    }

    pub fn config(&self) -> &LocalConfig {
        self.config
    }

    /// Put `dir` in front of `PATH` for every later command
    pub fn prepend_path(&mut self, dir: PathBuf) {
        self.path_prefix.insert(0, dir);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("[{}] {}", self.app.id(), message);
        self.diagnostics.push(Diagnostic::new(Level::Info, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("[{}] {}", self.app.id(), message);
        self.diagnostics.push(Diagnostic::new(Level::Warning, message));
    }

    /// Messages collected so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Start a command in the build directory
    pub fn command(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program, &self.build_dir)
    }

    /// Run a command with the accumulated `PATH` and the run's timeout
    pub fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        let mut spec = spec.timeout(self.settings.timeout());
        if let Some(path) = self.search_path()? {
            spec = spec.env("PATH", path);
        }
        log::debug!("[{}] $ {}", self.app.id(), spec);
        self.runner.run(&spec)
    }

    /// Run a package manager command; a non-zero exit is a dependency
    /// installation failure
    pub fn install(&mut self, spec: CommandSpec) -> Result<()> {
        let command = spec.to_string();
        self.info(format!("Running `{}`", command));
        let output = self.run(spec)?;
        if output.success() {
            return Ok(());
        }
        Err(Error::DependencyInstall {
            app: self.app.id().to_string(),
            command,
            exit_code: output.exit_code,
            stderr: output.stderr,
        })
    }

    /// Apply the lock-file policy for a manifest without a lock file.
    ///
    /// A warning normally, a failure under `require-lock`. Not consulted
    /// when `ignore-lock` is set.
    pub fn missing_lock(&mut self, command: &str, lock_file: &str) -> Result<()> {
        if self.settings.require_lock {
            return Err(Error::DependencyInstall {
                app: self.app.id().to_string(),
                command: command.to_string(),
                exit_code: None,
                stderr: format!("{} not found and a lock file is required", lock_file),
            });
        }
        self.warn(format!(
            "{} not found; dependencies will be resolved without a lock file",
            lock_file
        ));
        Ok(())
    }

    /// Run a pre- or post-install step whose failure is only a warning
    pub fn run_hook<F>(&mut self, name: &str, step: F)
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if let Err(e) = step(self) {
            self.warn(format!("{} failed, continuing: {}", name, e));
        }
    }

    fn search_path(&self) -> Result<Option<OsString>> {
        if self.path_prefix.is_empty() {
            return Ok(None);
        }
        let existing = env::var_os("PATH").unwrap_or_default();
        let paths = self
            .path_prefix
            .iter()
            .cloned()
            .chain(env::split_paths(&existing));
        env::join_paths(paths).map(Some).map_err(|e| Error::Config {
            message: format!("cannot build PATH: {}", e),
            hint: None,
        })
    }
}
