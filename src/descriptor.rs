//! # Application Descriptor Parsing
//!
//! An application declares how it is built in a YAML descriptor at its root
//! (`.platform.app.yaml` by default). This module turns that file into a
//! [`Descriptor`]: the full normalized mapping, plus typed accessors for the
//! keys the build core reads (`name`, `type`, `build.flavor`,
//! `web.locations`, `mounts`, `dependencies`, `hooks.build`).
//!
//! ## Normalization
//!
//! - Legacy `web.document_root` / `web.passthru` keys are folded into
//!   `web.locations["/"]`.
//! - The ecosystem prefix of `type` is mapped through a static alias table
//!   (`hhvm` is served by the `php` flavors). The raw `type` string is kept
//!   as declared; [`AppType`] carries the normalized form.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::mounts::{self, Mounts};

/// Legacy ecosystem names and the ecosystem that replaces them.
pub const TYPE_ALIASES: &[(&str, &str)] = &[("hhvm", "php")];

/// Map an ecosystem name through [`TYPE_ALIASES`]
pub fn normalize_ecosystem(ecosystem: &str) -> &str {
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == ecosystem)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(ecosystem)
}

/// An application type split into ecosystem and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppType {
    /// Normalized ecosystem, e.g. `php`
    pub ecosystem: String,
    /// Version suffix, e.g. `7.0`
    pub version: Option<String>,
}

impl AppType {
    /// Parse `"<ecosystem>[:<version>]"`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (ecosystem, version) = match raw.split_once(':') {
            Some((ecosystem, version)) => (ecosystem, Some(version.trim())),
            None => (raw, None),
        };
        Self {
            ecosystem: normalize_ecosystem(ecosystem.trim()).to_string(),
            version: version.filter(|v| !v.is_empty()).map(str::to_string),
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}", self.ecosystem, version),
            None => write!(f, "{}", self.ecosystem),
        }
    }
}

/// One `web.locations` entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Location {
    pub root: Option<String>,
    pub passthru: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildSection {
    flavor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebSection {
    locations: BTreeMap<String, Location>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HooksSection {
    build: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourceSection {
    root: Option<String>,
}

/// The keys of a descriptor the build core reads
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TypedView {
    name: Option<String>,
    #[serde(rename = "type")]
    app_type: Option<String>,
    build: BuildSection,
    web: WebSection,
    hooks: HooksSection,
    dependencies: BTreeMap<String, BTreeMap<String, Value>>,
    source: SourceSection,
}

/// A parsed, normalized application descriptor.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    config: Mapping,
    name: Option<String>,
    app_type: Option<String>,
    flavor: Option<String>,
    locations: BTreeMap<String, Location>,
    build_hook: Option<String>,
    dependencies: BTreeMap<String, BTreeMap<String, String>>,
    source_root: Option<String>,
}

impl Descriptor {
    /// Read and parse a descriptor file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::DescriptorParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Parse descriptor content; `path` is only used for error messages.
    ///
    /// An empty document is an empty descriptor.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| Error::DescriptorParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_value(value, path)
    }

    /// Build a descriptor from an already-parsed YAML value.
    pub fn from_value(value: Value, path: &Path) -> Result<Self> {
        let mapping = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(Error::DescriptorParse {
                    path: path.to_path_buf(),
                    message: format!("expected a mapping at the top level, found {}", kind(&other)),
                })
            }
        };
        Self::from_mapping(mapping).map_err(|message| Error::DescriptorParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Build a descriptor from a mapping, normalizing legacy keys.
    fn from_mapping(mut config: Mapping) -> std::result::Result<Self, String> {
        normalize_web(&mut config);

        let typed: TypedView =
            serde_yaml::from_value(Value::Mapping(config.clone())).map_err(|e| e.to_string())?;

        let dependencies = typed
            .dependencies
            .into_iter()
            .map(|(ecosystem, packages)| {
                let packages = packages
                    .into_iter()
                    .map(|(package, version)| (package, scalar_to_string(&version)))
                    .collect();
                (ecosystem, packages)
            })
            .collect();

        if let Some(root) = typed.web.locations.get("/").and_then(|l| l.root.as_deref()) {
            crate::path::contained_relative(root)
                .map_err(|message| format!("document root {}", message))?;
        }

        Ok(Self {
            config,
            name: typed.name.filter(|n| !n.trim().is_empty()),
            app_type: typed.app_type,
            flavor: typed.build.flavor,
            locations: typed.web.locations,
            build_hook: typed.hooks.build.filter(|h| !h.trim().is_empty()),
            dependencies,
            source_root: typed.source.root,
        })
    }

    /// Replace the whole configuration, e.g. to test flavor detection.
    pub fn with_config(config: Mapping) -> Result<Self> {
        Self::from_mapping(config).map_err(|message| Error::DescriptorParse {
            path: "<override>".into(),
            message,
        })
    }

    /// The full normalized configuration
    pub fn config(&self) -> &Mapping {
        &self.config
    }

    /// The declared `name`, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The raw `type` string as declared
    pub fn raw_type(&self) -> Option<&str> {
        self.app_type.as_deref()
    }

    /// The parsed, alias-normalized `type`
    pub fn app_type(&self) -> Option<AppType> {
        self.app_type.as_deref().map(AppType::parse)
    }

    /// The explicit `build.flavor`, if any
    pub fn flavor(&self) -> Option<&str> {
        self.flavor.as_deref()
    }

    /// `web.locations`
    pub fn locations(&self) -> &BTreeMap<String, Location> {
        &self.locations
    }

    /// The application-relative document root.
    ///
    /// Taken from `web.locations["/"].root`; empty when unset, meaning the
    /// application root itself is served.
    pub fn document_root(&self) -> String {
        self.locations
            .get("/")
            .and_then(|l| l.root.as_deref())
            .map(crate::path::normalize_relative)
            .unwrap_or_default()
    }

    /// The `hooks.build` script, if any
    pub fn build_hook(&self) -> Option<&str> {
        self.build_hook.as_deref()
    }

    /// Global dependencies: ecosystem → package → version constraint
    pub fn dependencies(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.dependencies
    }

    /// `source.root`, used by entries of the multi-application file
    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    /// The normalized mount table
    pub fn mounts(&self) -> Result<Mounts> {
        match self.config.get("mounts") {
            None | Some(Value::Null) => Ok(Mounts::new()),
            Some(Value::Mapping(raw)) => mounts::normalize(raw),
            Some(other) => Err(Error::InvalidMount {
                path: "mounts".to_string(),
                message: format!("expected a mapping, found {}", kind(other)),
            }),
        }
    }
}

/// Fold legacy `web.document_root` and `web.passthru` into `web.locations`.
fn normalize_web(config: &mut Mapping) {
    let Some(Value::Mapping(web)) = config.get_mut("web") else {
        return;
    };

    let document_root = web.remove("document_root");
    let passthru = web.remove("passthru");
    if document_root.is_none() && passthru.is_none() {
        return;
    }

    let locations = web
        .entry(Value::from("locations"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !locations.is_mapping() {
        *locations = Value::Mapping(Mapping::new());
    }
    let Value::Mapping(locations) = locations else {
        return;
    };
    let root_location = locations
        .entry(Value::from("/"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    let Value::Mapping(root_location) = root_location else {
        return;
    };

    if let Some(document_root) = document_root {
        if !root_location.contains_key("root") {
            root_location.insert(Value::from("root"), document_root);
        }
    }
    if let Some(passthru) = passthru {
        if !root_location.contains_key("passthru") {
            root_location.insert(Value::from("passthru"), passthru);
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "*".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
