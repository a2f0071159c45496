//! # Application Discovery
//!
//! A repository holds one or more applications. Each application is rooted
//! at a directory containing a descriptor file (`.platform.app.yaml`), or is
//! declared as an entry of the repository's multi-application file
//! (`.platform/applications.yaml`) with a `source.root`.
//!
//! ## Algorithm
//!
//! 1.  Walk the repository up to `max_depth` levels, never descending into
//!     ignored directory names or the project's local build state.
//! 2.  Every descriptor file found makes its parent directory an application
//!     root. Applications may nest: a root can contain further roots.
//! 3.  Entries of the multi-application file are added.
//! 4.  Applications are ordered by root path (component-wise, so parents come
//!     before their children and siblings sort lexicographically).
//! 5.  Each application records the roots nested inside it, so that staging
//!     never copies a nested application into its ancestor's build.
//! 6.  Ids are assigned (`name`, else relative path, else `default`) and
//!     duplicates get a numeric suffix in discovery order.
//!
//! Finding nothing is not an error; the caller decides.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde_yaml::Value;
use walkdir::WalkDir;

use crate::config::LocalConfig;
use crate::defaults::DEFAULT_APP_ID;
use crate::descriptor::{AppType, Descriptor};
use crate::error::{Error, Result};
use crate::mounts::Mounts;
use crate::path::{compile_patterns, name_matches, slugify, to_slash};

/// One buildable unit discovered in a repository
#[derive(Debug, Clone)]
pub struct Application {
    root: PathBuf,
    relative_path: String,
    id: String,
    descriptor: Descriptor,
    nested_roots: Vec<PathBuf>,
}

impl Application {
    /// Create an application rooted at `root` inside `repository_root`.
    ///
    /// The id is derived from the descriptor and path; the Locator may later
    /// suffix it to keep ids unique.
    pub fn new(root: PathBuf, repository_root: &Path, descriptor: Descriptor) -> Self {
        let relative_path = root
            .strip_prefix(repository_root)
            .map(to_slash)
            .unwrap_or_default();
        let id = default_id(&descriptor, &relative_path);
        Self {
            root,
            relative_path,
            id,
            descriptor,
            nested_roots: Vec::new(),
        }
    }

    /// The implicit application of a repository without any descriptor
    pub fn implicit(repository_root: &Path) -> Self {
        Self::new(
            repository_root.to_path_buf(),
            repository_root,
            Descriptor::default(),
        )
    }

    /// Absolute application root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository-relative root with forward slashes; empty for the root
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Unique id within the repository
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The id as a single, filesystem-safe directory name
    pub fn slug(&self) -> String {
        slugify(&self.id)
    }

    /// The declared name, if any
    pub fn name(&self) -> Option<&str> {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The parsed type; `None` when the descriptor declares none
    pub fn app_type(&self) -> Option<AppType> {
        self.descriptor.app_type()
    }

    /// The normalized mount table
    pub fn mounts(&self) -> Result<Mounts> {
        self.descriptor.mounts()
    }

    /// Roots of applications nested inside this one
    pub fn nested_roots(&self) -> &[PathBuf] {
        &self.nested_roots
    }

    /// Replace the descriptor configuration.
    ///
    /// The id is re-derived from the new configuration.
    pub fn set_config(&mut self, config: serde_yaml::Mapping) -> Result<()> {
        self.descriptor = Descriptor::with_config(config)?;
        self.id = default_id(&self.descriptor, &self.relative_path);
        Ok(())
    }
}

fn default_id(descriptor: &Descriptor, relative_path: &str) -> String {
    if let Some(name) = descriptor.name() {
        return name.to_string();
    }
    if !relative_path.is_empty() {
        return relative_path.replace('/', "-");
    }
    DEFAULT_APP_ID.to_string()
}

/// Finds the applications of a repository
#[derive(Debug)]
pub struct Locator<'a> {
    config: &'a LocalConfig,
    ignored: Vec<Pattern>,
}

impl<'a> Locator<'a> {
    pub fn new(config: &'a LocalConfig) -> Result<Self> {
        Ok(Self {
            config,
            ignored: compile_patterns(&config.ignored_dirs)?,
        })
    }

    /// Find every application in the repository at `repository_root`.
    pub fn locate(&self, repository_root: &Path) -> Result<Vec<Application>> {
        let repository_root = fs::canonicalize(repository_root)?;
        let mut applications = self.scan_descriptors(&repository_root)?;
        applications.extend(self.read_applications_file(&repository_root)?);

        // Stable: entries sharing a root keep their discovery order.
        applications.sort_by(|a, b| a.root.cmp(&b.root));

        assign_nested_roots(&mut applications);
        assign_unique_ids(&mut applications);

        log::debug!(
            "Found {} application(s) in {}",
            applications.len(),
            repository_root.display()
        );
        Ok(applications)
    }

    fn scan_descriptors(&self, repository_root: &Path) -> Result<Vec<Application>> {
        let excluded = [
            self.config.local_path(repository_root),
            self.config.web_root_path(repository_root),
        ];

        let walker = WalkDir::new(repository_root)
            .max_depth(self.config.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if excluded.iter().any(|p| p == entry.path()) {
                    return false;
                }
                !(entry.file_type().is_dir()
                    && name_matches(&self.ignored, &entry.file_name().to_string_lossy()))
            });

        let mut applications = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable path during discovery: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.file_name().to_string_lossy() != self.config.app_config_file
            {
                continue;
            }
            let Some(app_root) = entry.path().parent() else {
                continue;
            };
            let descriptor = Descriptor::from_file(entry.path())?;
            log::debug!("Found application descriptor {}", entry.path().display());
            applications.push(Application::new(
                app_root.to_path_buf(),
                repository_root,
                descriptor,
            ));
        }
        Ok(applications)
    }

    fn read_applications_file(&self, repository_root: &Path) -> Result<Vec<Application>> {
        let path = repository_root.join(&self.config.applications_file);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        let parse_error = |message: String| Error::DescriptorParse {
            path: path.clone(),
            message,
        };
        let value: Value =
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;

        let entries = match value {
            Value::Null => Vec::new(),
            Value::Sequence(entries) => entries,
            // A mapping of name → descriptor is accepted too.
            Value::Mapping(mapping) => mapping
                .into_iter()
                .map(|(name, entry)| with_default_name(entry, name))
                .collect(),
            _ => {
                return Err(parse_error(
                    "expected a list of application descriptors".to_string(),
                ))
            }
        };

        let mut applications = Vec::new();
        for entry in entries {
            let descriptor = Descriptor::from_value(entry, &path)?;
            let source_root = descriptor
                .source_root()
                .map(crate::path::normalize_relative)
                .unwrap_or_default();
            let app_root = repository_root.join(&source_root);
            if !app_root.is_dir() {
                return Err(parse_error(format!(
                    "source.root '{}' is not a directory",
                    source_root
                )));
            }
            applications.push(Application::new(app_root, repository_root, descriptor));
        }
        Ok(applications)
    }
}

fn with_default_name(entry: Value, name: Value) -> Value {
    match entry {
        Value::Mapping(mut mapping) => {
            if !mapping.contains_key("name") {
                mapping.insert(Value::from("name"), name);
            }
            Value::Mapping(mapping)
        }
        other => other,
    }
}

fn assign_nested_roots(applications: &mut [Application]) {
    let roots: Vec<PathBuf> = applications.iter().map(|a| a.root.clone()).collect();
    for app in applications.iter_mut() {
        let mut nested: Vec<PathBuf> = roots
            .iter()
            .filter(|r| *r != &app.root && r.starts_with(&app.root))
            .cloned()
            .collect();
        nested.dedup();
        app.nested_roots = nested;
    }
}

fn assign_unique_ids(applications: &mut [Application]) {
    let mut taken: HashSet<String> = HashSet::new();
    for app in applications.iter_mut() {
        if taken.insert(app.id.clone()) {
            continue;
        }
        let base = app.id.clone();
        let mut n = 2;
        let unique = loop {
            let candidate = format!("{}-{}", base, n);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        log::warn!(
            "Application id '{}' at {} is already used, using '{}'",
            base,
            app.root.display(),
            unique
        );
        taken.insert(unique.clone());
        app.id = unique;
    }
}

/// Find the applications of a repository with the given configuration.
pub fn locate(repository_root: &Path, config: &LocalConfig) -> Result<Vec<Application>> {
    Locator::new(config)?.locate(repository_root)
}
