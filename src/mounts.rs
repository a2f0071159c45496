//! # Mount Resolution
//!
//! A mount is an application-relative directory that is backed by something
//! other than the build output: persistent shared storage, a service, or a
//! scratch directory. Descriptors declare them as a table of
//! `target path → definition`, where the definition is either a mapping
//! (`{source: local, source_path: files}`) or the legacy string form
//! `shared:files/<source_path>`.
//!
//! Normalization produces a [`Mounts`] table whose keys never carry leading
//! or trailing slashes. Targets and source paths are plain relative paths:
//! a `.` or `..` component makes the definition invalid. It is idempotent: a normalized table, serialized back
//! to YAML and normalized again, is unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::path::{contained_relative, normalize_relative};

/// Prefix of the legacy string mount definition
const LEGACY_SHARED_PREFIX: &str = "shared:files";

/// Source path assumed for a shared mount declaring an empty one
const DEFAULT_SHARED_SOURCE: &str = "files";

/// Where a mount's content comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountSource {
    /// Persistent storage local to the application (shared across builds)
    Local,
    /// A network storage service
    Service,
    /// Scratch space that does not survive restarts
    Tmp,
}

/// A normalized mount definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDefinition {
    pub source: MountSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl MountDefinition {
    /// Whether the mount is backed by shared persistent storage
    pub fn is_shared(&self) -> bool {
        self.source == MountSource::Local && self.source_path.is_some()
    }

    /// Human-readable description of the source, as shown next to a mount path
    pub fn describe(&self) -> String {
        match (&self.source, &self.service, &self.source_path) {
            (MountSource::Local, _, None) => "local".to_string(),
            (MountSource::Local, _, Some(path)) => format!("local:{}", path),
            (MountSource::Service, Some(service), Some(path)) => {
                format!("service:{}/{}", service, path)
            }
            (MountSource::Service, Some(service), None) => format!("service:{}", service),
            (MountSource::Service, None, _) => "service".to_string(),
            (MountSource::Tmp, _, _) => "tmp".to_string(),
        }
    }
}

/// Normalized mount table: target path → definition
pub type Mounts = BTreeMap<String, MountDefinition>;

/// Normalize a raw mount table.
pub fn normalize(raw: &Mapping) -> Result<Mounts> {
    let mut mounts = Mounts::new();
    for (key, definition) in raw {
        let Some(path) = key.as_str() else {
            return Err(Error::InvalidMount {
                path: format!("{:?}", key),
                message: "mount paths must be strings".to_string(),
            });
        };
        let path = contained_relative(path).map_err(|message| Error::InvalidMount {
            path: path.to_string(),
            message,
        })?;
        if path.is_empty() {
            return Err(Error::InvalidMount {
                path: "/".to_string(),
                message: "the application root cannot be a mount".to_string(),
            });
        }
        let definition = normalize_definition(&path, definition)?;
        mounts.insert(path, definition);
    }
    Ok(mounts)
}

/// Serialize a normalized table back into its YAML mapping form.
pub fn to_mapping(mounts: &Mounts) -> Result<Mapping> {
    match serde_yaml::to_value(mounts)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Ok(Mapping::new()),
    }
}

fn normalize_definition(path: &str, definition: &Value) -> Result<MountDefinition> {
    match definition {
        Value::String(legacy) => parse_legacy(path, legacy),
        Value::Mapping(mapping) => {
            if !mapping.contains_key("source") {
                return Err(Error::InvalidMount {
                    path: path.to_string(),
                    message: "the definition has no 'source'".to_string(),
                });
            }
            let mut definition: MountDefinition =
                serde_yaml::from_value(Value::Mapping(mapping.clone())).map_err(|e| {
                    Error::InvalidMount {
                        path: path.to_string(),
                        message: e.to_string(),
                    }
                })?;
            definition.source_path = definition
                .source_path
                .map(|p| source_path(path, &p))
                .transpose()?;
            Ok(definition)
        }
        _ => Err(Error::InvalidMount {
            path: path.to_string(),
            message: "expected a string or a mapping".to_string(),
        }),
    }
}

fn parse_legacy(path: &str, legacy: &str) -> Result<MountDefinition> {
    let Some(rest) = legacy.trim().strip_prefix(LEGACY_SHARED_PREFIX) else {
        return Err(Error::InvalidMount {
            path: path.to_string(),
            message: format!("unrecognized mount definition '{}'", legacy),
        });
    };
    Ok(MountDefinition {
        source: MountSource::Local,
        source_path: Some(source_path(path, rest)?),
        service: None,
    })
}

fn source_path(path: &str, source: &str) -> Result<String> {
    contained_relative(source).map_err(|message| Error::InvalidMount {
        path: path.to_string(),
        message: format!("source path {}", message),
    })
}

/// Find the declared mount matching a user-supplied path.
///
/// The input is normalized like mount keys are, then matched exactly
/// (case-sensitive). No guessing: an unknown path is an error, and choosing
/// between candidates is left to the caller.
pub fn match_path(partial: &str, mounts: &Mounts) -> Result<String> {
    let normalized = normalize_relative(partial);
    if mounts.contains_key(&normalized) {
        return Ok(normalized);
    }
    Err(Error::MountNotFound {
        path: partial.to_string(),
        available: mounts.keys().cloned().collect(),
    })
}

/// The mounts backed by shared persistent storage.
///
/// Maps each target path to its storage sub-directory; used to pick default
/// local directories for the shared files of an application.
pub fn shared_file_mounts(mounts: &Mounts) -> BTreeMap<String, String> {
    mounts
        .iter()
        .filter(|(_, definition)| definition.is_shared())
        .map(|(path, definition)| {
            let source = definition
                .source_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .unwrap_or(DEFAULT_SHARED_SOURCE);
            (path.clone(), source.to_string())
        })
        .collect()
}
