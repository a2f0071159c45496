//! Orchestrator for a complete local build
//!
//! This module coordinates all phases to provide a clean API for building
//! every application of a repository.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use super::{
    discovery, install, publish, staging, BuildReport, BuildResult, Diagnostic, Failure,
    FailureKind, Level,
};
use crate::config::{BuildSettings, LocalConfig};
use crate::error::{Error, Result};
use crate::filesystem;
use crate::flavor::{BuildContext, BuildFlavor, FlavorRegistry};
use crate::locator::{Application, Locator};
use crate::process::CommandRunner;

/// Where the outputs of one run go
struct Layout {
    project_root: PathBuf,
    /// Whether the repository holds more than one application
    multiple: bool,
}

impl Layout {
    fn web_root(&self, config: &LocalConfig, app: &Application) -> PathBuf {
        let web_root = config.web_root_path(&self.project_root);
        if self.multiple {
            web_root.join(app.slug())
        } else {
            web_root
        }
    }

    fn shared_dir(&self, config: &LocalConfig, app: &Application) -> PathBuf {
        let shared = config.shared_path(&self.project_root);
        if self.multiple {
            shared.join(app.slug())
        } else {
            shared
        }
    }

    fn deps_dir(&self, config: &LocalConfig, app: &Application) -> PathBuf {
        config.deps_path(&self.project_root).join(app.slug())
    }
}

/// Builds the applications of a repository
///
/// The orchestrator owns its configuration, flavor registry and command
/// runner; nothing is process-global, so independent orchestrators can run
/// side by side.
pub struct Orchestrator {
    config: LocalConfig,
    registry: FlavorRegistry,
    runner: Arc<dyn CommandRunner>,
}

impl Orchestrator {
    pub fn new(config: LocalConfig, registry: FlavorRegistry, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            registry,
            runner,
        }
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    pub fn registry(&self) -> &FlavorRegistry {
        &self.registry
    }

    /// Find the applications of a repository
    pub fn locate(&self, repository_root: &Path) -> Result<Vec<Application>> {
        Locator::new(&self.config)?.locate(repository_root)
    }

    /// Shared file storage directory of `app`, one of `applications`
    pub fn shared_dir(
        &self,
        project_root: &Path,
        applications: &[Application],
        app: &Application,
    ) -> PathBuf {
        let layout = Layout {
            project_root: project_root.to_path_buf(),
            multiple: applications.len() > 1,
        };
        layout.shared_dir(&self.config, app)
    }

    /// Build every (selected) application of the repository.
    ///
    /// Per-application failures are reported in the returned
    /// [`BuildReport`]. Errors are returned for a malformed repository, and
    /// for the first failing application when `stop-on-failure` is set.
    pub fn build(&self, repository_root: &Path, settings: &BuildSettings) -> Result<BuildReport> {
        let project_root = fs::canonicalize(repository_root)?;

        // Phase 1: Discovery
        let applications = discovery::execute(&project_root, &self.config, settings)?;
        let layout = Layout {
            multiple: applications.len() > 1,
            project_root,
        };
        let selected = discovery::select(applications, &settings.only)?;

        if layout.multiple {
            publish::prepare_web_root_parent(&self.config.web_root_path(&layout.project_root))?;
        }

        // Phases 2-4, per application
        let results = if settings.is_parallel() {
            log::debug!("Building {} application(s) with {} jobs", selected.len(), settings.jobs);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(settings.jobs)
                .build()
                .map_err(|e| Error::Config {
                    message: format!("cannot start build workers: {}", e),
                    hint: Some("Try a lower --jobs value".to_string()),
                })?;
            pool.install(|| {
                selected
                    .par_iter()
                    .map(|app| self.build_application(app, &layout, settings))
                    .collect::<Vec<_>>()
            })
        } else {
            let mut results = Vec::with_capacity(selected.len());
            for app in &selected {
                let result = self.build_application(app, &layout, settings);
                if !result.success && settings.stop_on_failure {
                    return Err(Error::BuildAborted {
                        app: result.app_id,
                        message: result
                            .failure
                            .map(|f| f.to_string())
                            .unwrap_or_default(),
                    });
                }
                results.push(result);
            }
            results
        };

        let report = BuildReport::new(results);
        log::info!(
            "Built {}/{} application(s)",
            report.results.iter().filter(|r| r.success).count(),
            report.results.len()
        );
        Ok(report)
    }

    fn build_application(&self, app: &Application, layout: &Layout, settings: &BuildSettings) -> BuildResult {
        let flavor = self.registry.resolve_application(app);
        log::info!(
            "[{}] Building {} with flavor '{}'",
            app.id(),
            app.root().display(),
            flavor.name()
        );

        let build_dir = staging::build_dir(&self.config, &layout.project_root, app);
        let mut context =
            BuildContext::new(app, build_dir.clone(), settings, &self.config, self.runner.as_ref());

        let outcome = self.run_phases(app, &mut context, flavor.as_ref(), layout);
        let mut diagnostics = context.into_diagnostics();

        let (web_root, failure) = match outcome {
            Ok(web_root) => (web_root, None),
            Err(failure) => {
                log::error!("[{}] {}", app.id(), failure);
                diagnostics.push(Diagnostic::new(Level::Error, failure.to_string()));
                (None, Some(failure))
            }
        };

        BuildResult {
            app_id: app.id().to_string(),
            root: app.root().to_path_buf(),
            build_dir,
            flavor: flavor.name().to_string(),
            success: failure.is_none(),
            web_root,
            failure,
            diagnostics,
        }
    }

    fn run_phases(
        &self,
        app: &Application,
        context: &mut BuildContext<'_>,
        flavor: &dyn BuildFlavor,
        layout: &Layout,
    ) -> std::result::Result<Option<PathBuf>, Failure> {
        let settings = context.settings().clone();

        // Phase 2: Staging
        app.mounts().map_err(|e| Failure::from_error(FailureKind::Staging, &e))?;
        let staged = staging::execute(
            app,
            flavor.name(),
            &layout.project_root,
            &self.config,
            &settings,
        )
        .map_err(|e| Failure::from_error(FailureKind::Staging, &e))?;
        log::debug!("[{}] tree_id {}", app.id(), staged.metadata.tree_id);

        // Phase 3: Install
        install::execute(context, flavor, &layout.deps_dir(&self.config, app))
            .map_err(|e| Failure::from_error(FailureKind::DependencyInstall, &e))?;

        // Phase 4: Publish
        let publish_failure = |e: Error| Failure::from_error(FailureKind::Publish, &e);
        publish::link_shared_mounts(context, &layout.shared_dir(&self.config, app))
            .map_err(publish_failure)?;
        publish::publish_web_root(context, &layout.web_root(&self.config, app))
            .map_err(publish_failure)
    }

    /// Remove build output of a repository.
    ///
    /// Removes the build and dependency directories of the applications in
    /// `only` (all when empty) and, with `all`, the published web root and
    /// shared file storage as well. Returns the removed paths.
    pub fn clean(&self, repository_root: &Path, only: &[String], all: bool) -> Result<Vec<PathBuf>> {
        let project_root = fs::canonicalize(repository_root)?;
        let applications =
            discovery::execute(&project_root, &self.config, &BuildSettings::default())?;
        let layout = Layout {
            multiple: applications.len() > 1,
            project_root,
        };
        let selected = discovery::select(applications, only)?;

        let mut candidates = Vec::new();
        for app in &selected {
            candidates.push(staging::build_dir(&self.config, &layout.project_root, app));
            candidates.push(layout.deps_dir(&self.config, app));
            if !all {
                candidates.push(layout.web_root(&self.config, app));
            }
        }
        if all {
            candidates.push(self.config.web_root_path(&layout.project_root));
            candidates.push(self.config.shared_path(&layout.project_root));
        }

        let mut removed = Vec::new();
        for path in candidates {
            if filesystem::exists(&path) {
                filesystem::remove(&path)?;
                log::info!("Removed {}", path.display());
                removed.push(path);
            }
        }
        Ok(removed)
    }
}
