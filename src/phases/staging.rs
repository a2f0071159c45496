//! Phase 2: Staging
//!
//! Prepares the private build directory of one application:
//!
//! - Removes the previous build directory unless `no-clean` is set.
//! - Copies the application source into it, leaving out ignored directory
//!   names, the project's local state and published web root, and the roots
//!   of nested applications.
//! - Writes `.local-build.json` with the application id, type, flavor and a
//!   `tree_id` fingerprint of the staged source and output-affecting
//!   settings. The file holds no timestamps so identical input gives
//!   identical output.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::{BuildSettings, LocalConfig};
use crate::defaults::BUILD_METADATA_FILE;
use crate::error::{Error, Result};
use crate::filesystem;
use crate::locator::Application;
use crate::path::{compile_patterns, name_matches, to_slash};

/// Contents of the build metadata file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub id: String,
    #[serde(rename = "type")]
    pub app_type: Option<String>,
    pub flavor: String,
    pub tree_id: String,
}

impl BuildMetadata {
    /// Read the metadata of an existing build directory
    pub fn read(build_dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(build_dir.join(BUILD_METADATA_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A staged build directory
#[derive(Debug, Clone)]
pub struct StagedBuild {
    pub build_dir: PathBuf,
    pub metadata: BuildMetadata,
    /// Number of files copied from the source
    pub files: usize,
}

/// The build directory of `app` inside `project_root`
pub fn build_dir(config: &LocalConfig, project_root: &Path, app: &Application) -> PathBuf {
    config.builds_path(project_root).join(app.slug())
}

/// Paths below an application root that never reach its build directory
struct Exclusions {
    ignored: Vec<Pattern>,
    paths: Vec<PathBuf>,
}

impl Exclusions {
    fn new(app: &Application, project_root: &Path, config: &LocalConfig) -> Result<Self> {
        let mut paths = app.nested_roots().to_vec();
        paths.push(config.local_path(project_root));
        paths.push(config.web_root_path(project_root));
        Ok(Self {
            ignored: compile_patterns(&config.ignored_dirs)?,
            paths,
        })
    }

    fn skips(&self, path: &Path) -> bool {
        if self.paths.iter().any(|p| p == path) {
            return true;
        }
        path.file_name()
            .map(|name| name_matches(&self.ignored, &name.to_string_lossy()))
            .unwrap_or(false)
    }
}

/// Execute Phase 2 for one application
pub fn execute(
    app: &Application,
    flavor: &str,
    project_root: &Path,
    config: &LocalConfig,
    settings: &BuildSettings,
) -> Result<StagedBuild> {
    let staging_error = |message: String| Error::Staging {
        app: app.id().to_string(),
        message,
    };

    let build_dir = build_dir(config, project_root, app);
    let exclusions = Exclusions::new(app, project_root, config)?;

    if settings.no_clean {
        log::debug!("[{}] Keeping {} (no-clean)", app.id(), build_dir.display());
    } else {
        filesystem::remove(&build_dir).map_err(|e| {
            staging_error(format!("cannot remove {}: {}", build_dir.display(), e))
        })?;
    }

    let files = filesystem::copy_all(app.root(), &build_dir, |path| exclusions.skips(path))
        .map_err(|e| staging_error(format!("cannot copy {}: {}", app.root().display(), e)))?;
    log::debug!(
        "[{}] Staged {} file(s) into {}",
        app.id(),
        files,
        build_dir.display()
    );

    let tree_id = tree_id(app.root(), &exclusions, flavor, settings)
        .map_err(|e| staging_error(format!("cannot fingerprint source: {}", e)))?;
    let metadata = BuildMetadata {
        id: app.id().to_string(),
        app_type: app.descriptor().raw_type().map(str::to_string),
        flavor: flavor.to_string(),
        tree_id,
    };
    let json = serde_json::to_string_pretty(&metadata)?;
    fs::write(build_dir.join(BUILD_METADATA_FILE), json + "\n")
        .map_err(|e| staging_error(format!("cannot write {}: {}", BUILD_METADATA_FILE, e)))?;

    Ok(StagedBuild {
        build_dir,
        metadata,
        files,
    })
}

/// SHA-256 over the staged source tree, the flavor and the settings that
/// change what a build produces
fn tree_id(
    root: &Path,
    exclusions: &Exclusions,
    flavor: &str,
    settings: &BuildSettings,
) -> Result<String> {
    let mut hasher = Sha256::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !exclusions.skips(entry.path()));
    for entry in walker {
        let entry = entry.map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        let relative = entry.path().strip_prefix(root).map(to_slash).unwrap_or_default();
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            hasher.update(b"l\0");
            hasher.update(relative.as_bytes());
            hasher.update(b"\0");
            hasher.update(to_slash(&fs::read_link(entry.path())?).as_bytes());
        } else if file_type.is_file() {
            hasher.update(b"f\0");
            hasher.update(relative.as_bytes());
            hasher.update(b"\0");
            hasher.update(fs::read(entry.path())?);
        } else {
            hasher.update(b"d\0");
            hasher.update(relative.as_bytes());
        }
        hasher.update(b"\n");
    }

    hasher.update(flavor.as_bytes());
    for (name, value) in settings.output_affecting() {
        hasher.update(format!("\n{}={}", name, value).as_bytes());
    }
    Ok(hex::encode(hasher.finalize()))
}
