//! Default values for local-build configuration.
//!
//! This module provides centralized default values used across the library
//! and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// File name of a per-application descriptor.
pub const DEFAULT_APP_CONFIG_FILE: &str = ".platform.app.yaml";

/// Repository-relative path of the multi-application descriptor list.
pub const DEFAULT_APPLICATIONS_FILE: &str = ".platform/applications.yaml";

/// Project-relative directory holding all local build state.
pub const DEFAULT_LOCAL_DIR: &str = ".platform/local";

/// Build directories, relative to the local directory.
pub const DEFAULT_BUILD_DIR: &str = "builds";

/// Shared file mount storage, relative to the local directory.
pub const DEFAULT_SHARED_DIR: &str = "shared";

/// Global dependency installs, relative to the local directory.
pub const DEFAULT_DEPS_DIR: &str = "deps";

/// Project-relative location of the published web root.
pub const DEFAULT_WEB_ROOT: &str = "_www";

/// Per-project configuration file, relative to the local directory.
pub const PROJECT_CONFIG_FILE: &str = "project.yaml";

/// Name of the metadata file written into every build directory.
pub const BUILD_METADATA_FILE: &str = ".local-build.json";

/// How many directory levels below the repository root are searched.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Directory names never searched for descriptors nor copied into builds.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[".git", "node_modules", "vendor", ".platform"];

/// Application id used when neither a name nor a relative path is available.
pub const DEFAULT_APP_ID: &str = "default";

/// Flavor key used when a descriptor does not set `build.flavor`.
pub const DEFAULT_FLAVOR_KEY: &str = "default";

/// Returns the default location of the user configuration file.
///
/// Uses the platform-appropriate configuration directory:
/// - Linux: `~/.config/local-build/config.yaml` (XDG Base Directory)
/// - macOS: `~/Library/Application Support/local-build/config.yaml`
/// - Windows: `{FOLDERID_RoamingAppData}\local-build\config.yaml`
///
/// Falls back to `.local-build/config.yaml` in the current directory if the
/// platform configuration directory cannot be determined.
///
/// This can be overridden by the `--config` CLI flag or the
/// `LOCAL_BUILD_CONFIG` environment variable.
pub fn default_user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".local-build"))
        .join("local-build")
        .join("config.yaml")
}
