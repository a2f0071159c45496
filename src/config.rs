//! # Tool Configuration and Build Settings
//!
//! This module defines the two configuration structures the build core
//! consumes:
//!
//! - **`LocalConfig`**: where things live. The descriptor file name, the
//!   project-local state directory and its sub-directories, the published
//!   web root, the directory names the Locator ignores, and the executables
//!   used for each package manager.
//!
//! - **`BuildSettings`**: how a single build run behaves (clean or not, copy
//!   or symlink, lock-file policy, failure policy, parallelism, timeout).
//!
//! ## Layering
//!
//! `LocalConfig` is assembled from, in increasing precedence:
//!
//! 1.  Built-in defaults (see [`crate::defaults`]).
//! 2.  The user configuration file (`~/.config/local-build/config.yaml`).
//! 3.  The `local:` section of the per-project file
//!     `<project>/.platform/local/project.yaml`. This file is only read.
//! 4.  `LOCAL_BUILD_<TOOL>` environment variables for tool executables.
//!
//! Every YAML layer may set any subset of fields; unset fields keep the value
//! of the previous layer.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Executables used to run each ecosystem's tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCommands {
    pub composer: String,
    pub npm: String,
    pub pip: String,
    pub gem: String,
    /// Shell used to run descriptor build hooks
    pub shell: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            composer: "composer".to_string(),
            npm: "npm".to_string(),
            pip: "pip".to_string(),
            gem: "gem".to_string(),
            shell: if cfg!(windows) { "cmd" } else { "sh" }.to_string(),
        }
    }
}

/// Layout and tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// File name of a per-application descriptor
    pub app_config_file: String,
    /// Repository-relative path of the multi-application descriptor list
    pub applications_file: String,
    /// Project-relative directory for local build state
    pub local_dir: String,
    /// Build directories, relative to `local_dir`
    pub build_dir: String,
    /// Shared file mount storage, relative to `local_dir`
    pub shared_dir: String,
    /// Global dependency installs, relative to `local_dir`
    pub deps_dir: String,
    /// Project-relative published web root
    pub web_root: String,
    /// Glob patterns for directory names that are never searched or copied
    pub ignored_dirs: Vec<String>,
    /// Maximum search depth below the repository root
    pub max_depth: usize,
    /// Package manager and shell executables
    pub tools: ToolCommands,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            app_config_file: defaults::DEFAULT_APP_CONFIG_FILE.to_string(),
            applications_file: defaults::DEFAULT_APPLICATIONS_FILE.to_string(),
            local_dir: defaults::DEFAULT_LOCAL_DIR.to_string(),
            build_dir: defaults::DEFAULT_BUILD_DIR.to_string(),
            shared_dir: defaults::DEFAULT_SHARED_DIR.to_string(),
            deps_dir: defaults::DEFAULT_DEPS_DIR.to_string(),
            web_root: defaults::DEFAULT_WEB_ROOT.to_string(),
            ignored_dirs: defaults::DEFAULT_IGNORED_DIRS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_depth: defaults::DEFAULT_MAX_DEPTH,
            tools: ToolCommands::default(),
        }
    }
}

/// Per-project overrides file layout
#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    local: Option<serde_yaml::Value>,
}

impl LocalConfig {
    /// Load configuration for a project.
    ///
    /// `user_config` is the user-level file; a missing file is not an error.
    pub fn load(user_config: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut value = serde_yaml::to_value(Self::default())?;

        if let Some(path) = user_config {
            if path.is_file() {
                log::debug!("Loading user configuration from {}", path.display());
                let layer = read_yaml(path)?;
                merge_layer(&mut value, layer);
            }
        }

        let project_file = project_root
            .join(defaults::DEFAULT_LOCAL_DIR)
            .join(defaults::PROJECT_CONFIG_FILE);
        if project_file.is_file() {
            log::debug!(
                "Loading project configuration from {}",
                project_file.display()
            );
            let content = fs::read_to_string(&project_file)?;
            let parsed: ProjectFile = serde_yaml::from_str(&content).map_err(|e| Error::Config {
                message: format!("{}: {}", project_file.display(), e),
                hint: None,
            })?;
            if let Some(local) = parsed.local {
                merge_layer(&mut value, local);
            }
        }

        let mut config: LocalConfig = serde_yaml::from_value(value).map_err(|e| Error::Config {
            message: e.to_string(),
            hint: Some("Check the field types in your config.yaml".to_string()),
        })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override tool executables from `LOCAL_BUILD_<TOOL>` variables
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 5] = [
            ("LOCAL_BUILD_COMPOSER", &mut self.tools.composer),
            ("LOCAL_BUILD_NPM", &mut self.tools.npm),
            ("LOCAL_BUILD_PIP", &mut self.tools.pip),
            ("LOCAL_BUILD_GEM", &mut self.tools.gem),
            ("LOCAL_BUILD_SHELL", &mut self.tools.shell),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = env::var(var) {
                if !value.is_empty() {
                    *slot = value;
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.app_config_file.trim().is_empty() {
            return Err(Error::Config {
                message: "app_config_file must not be empty".to_string(),
                hint: None,
            });
        }
        if self.max_depth == 0 {
            return Err(Error::Config {
                message: "max_depth must be at least 1".to_string(),
                hint: Some("Use max_depth: 2 to only search immediate sub-directories".to_string()),
            });
        }
        crate::path::compile_patterns(&self.ignored_dirs)?;
        Ok(())
    }

    /// Absolute local state directory of a project
    pub fn local_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.local_dir)
    }

    /// Absolute directory holding all build directories
    pub fn builds_path(&self, project_root: &Path) -> PathBuf {
        self.local_path(project_root).join(&self.build_dir)
    }

    /// Absolute directory holding shared file mount storage
    pub fn shared_path(&self, project_root: &Path) -> PathBuf {
        self.local_path(project_root).join(&self.shared_dir)
    }

    /// Absolute directory holding global dependency installs
    pub fn deps_path(&self, project_root: &Path) -> PathBuf {
        self.local_path(project_root).join(&self.deps_dir)
    }

    /// Absolute published web root
    pub fn web_root_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.web_root)
    }

    /// The named local sub-directories of a project, as shown by `dir`
    pub fn sub_dirs(&self, project_root: &Path) -> BTreeMap<&'static str, PathBuf> {
        let mut dirs = BTreeMap::new();
        dirs.insert("builds", self.builds_path(project_root));
        dirs.insert("local", self.local_path(project_root));
        dirs.insert("shared", self.shared_path(project_root));
        dirs.insert("web", self.web_root_path(project_root));
        dirs.insert("web_root", self.web_root_path(project_root));
        dirs
    }
}

fn read_yaml(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| Error::Config {
        message: format!("{}: {}", path.display(), e),
        hint: None,
    })
}

/// Overlay the keys of `layer` onto `base`, recursing into mappings
fn merge_layer(base: &mut serde_yaml::Value, layer: serde_yaml::Value) {
    match (base, layer) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_layer(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, serde_yaml::Value::Null) => {}
        (base, layer) => *base = layer,
    }
}

/// Flags controlling one build run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildSettings {
    /// Keep existing build directories instead of wiping them first
    pub no_clean: bool,
    /// Copy the web root into place instead of symlinking it
    pub copy: bool,
    /// Use absolute symlink targets
    pub abslinks: bool,
    /// Skip all dependency installation
    pub no_deps: bool,
    /// Skip the descriptor's build hook
    pub no_build_hooks: bool,
    /// Ignore dependency lock files and resolve afresh
    pub ignore_lock: bool,
    /// Treat a missing dependency lock file as fatal
    pub require_lock: bool,
    /// Abort the whole run after the first failing application
    pub stop_on_failure: bool,
    /// Fail when the repository declares no application
    pub require_applications: bool,
    /// Number of applications built concurrently
    pub jobs: usize,
    /// Per-command timeout in seconds
    pub timeout: Option<u64>,
    /// Only build the applications with these ids (all when empty)
    pub only: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            no_clean: false,
            copy: false,
            abslinks: false,
            no_deps: false,
            no_build_hooks: false,
            ignore_lock: false,
            require_lock: false,
            stop_on_failure: false,
            require_applications: false,
            jobs: 1,
            timeout: None,
            only: Vec::new(),
        }
    }
}

impl BuildSettings {
    /// The per-command timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Whether applications are built on a thread pool
    pub fn is_parallel(&self) -> bool {
        self.jobs > 1 && !self.stop_on_failure
    }

    /// Settings that change what ends up in a build directory.
    ///
    /// Used when fingerprinting a build; flags that only affect the failure
    /// policy or scheduling are left out.
    pub fn output_affecting(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("no-deps", self.no_deps),
            ("no-build-hooks", self.no_build_hooks),
            ("ignore-lock", self.ignore_lock),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let config = LocalConfig::default();
        let root = Path::new("/project");
        assert_eq!(
            config.builds_path(root),
            PathBuf::from("/project/.platform/local/builds")
        );
        assert_eq!(
            config.shared_path(root),
            PathBuf::from("/project/.platform/local/shared")
        );
        assert_eq!(config.web_root_path(root), PathBuf::from("/project/_www"));
    }

    #[test]
    #[serial]
    fn test_load_without_files_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = LocalConfig::load(None, temp.path()).unwrap();
        assert_eq!(config.app_config_file, ".platform.app.yaml");
        assert_eq!(config.max_depth, 5);
    }

    #[test]
    #[serial]
    fn test_load_layers_user_and_project() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("config.yaml");
        fs::write(
            &user,
            "web_root: public_html\ntools:\n  npm: /opt/node/bin/npm\n",
        )
        .unwrap();

        let project = temp.path().join("project");
        fs::create_dir_all(project.join(".platform/local")).unwrap();
        fs::write(
            project.join(".platform/local/project.yaml"),
            "id: abc123\nlocal:\n  web_root: www\n  max_depth: 2\n",
        )
        .unwrap();

        let config = LocalConfig::load(Some(&user), &project).unwrap();
        assert_eq!(config.web_root, "www");
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.tools.npm, "/opt/node/bin/npm");
        assert_eq!(config.tools.composer, "composer");
    }

    #[test]
    #[serial]
    fn test_env_overrides_tools() {
        let temp = TempDir::new().unwrap();
        env::set_var("LOCAL_BUILD_COMPOSER", "/usr/local/bin/composer2");
        let config = LocalConfig::load(None, temp.path());
        env::remove_var("LOCAL_BUILD_COMPOSER");
        assert_eq!(config.unwrap().tools.composer, "/usr/local/bin/composer2");
    }

    #[test]
    #[serial]
    fn test_invalid_max_depth_rejected() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("config.yaml");
        fs::write(&user, "max_depth: 0\n").unwrap();
        let err = LocalConfig::load(Some(&user), temp.path()).unwrap_err();
        assert!(err.to_string().contains("max_depth"));
        assert!(err.to_string().contains("hint: Use max_depth: 2"));
    }

    #[test]
    fn test_build_settings_kebab_case() {
        let settings: BuildSettings =
            serde_yaml::from_str("no-clean: true\ncopy: true\njobs: 4\n").unwrap();
        assert!(settings.no_clean);
        assert!(settings.copy);
        assert_eq!(settings.jobs, 4);
        assert!(settings.is_parallel());
    }

    #[test]
    fn test_stop_on_failure_forces_sequential() {
        let settings = BuildSettings {
            jobs: 8,
            stop_on_failure: true,
            ..BuildSettings::default()
        };
        assert!(!settings.is_parallel());
    }
}
