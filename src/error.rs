//! # Error Handling
//!
//! This module defines the centralized error type for `local-build`. It uses
//! the `thiserror` library to create a single `Error` enum covering every
//! failure the build core can report, each variant carrying enough context
//! (application id, path, command) to attribute the failure in a
//! multi-application build.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Discovery and mount-lookup errors propagate
//!   straight to the caller; per-application build errors are captured by the
//!   orchestrator into a [`crate::phases::BuildResult`] instead.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! An unrecognised application type is deliberately *not* an error: the
//! flavor registry logs it and falls back to the pass-through flavor.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for local-build operations
#[derive(Error, Debug)]
pub enum Error {
    /// An application descriptor could not be parsed as structured data.
    #[error("Failed to parse application descriptor {}: {message}", path.display())]
    DescriptorParse { path: PathBuf, message: String },

    /// A package manager exited with a non-zero status.
    #[error("Dependency installation failed for app '{app}': `{command}` exited with {}{}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "a signal".to_string()), format_stderr(stderr))]
    DependencyInstall {
        app: String,
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The descriptor's build hook exited with a non-zero status.
    #[error("Build hook failed for app '{app}' with exit code {}{}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()), format_stderr(stderr))]
    BuildHook {
        app: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// No application was found but at least one was required.
    #[error("No applications found in {}", root.display())]
    NoApplicationsFound { root: PathBuf },

    /// A user-supplied mount path did not match any declared mount.
    #[error("Mount not found: {path}{}", if available.is_empty() { String::new() } else { format!(" (available: {})", available.join(", ")) })]
    MountNotFound { path: String, available: Vec<String> },

    /// A mount definition in a descriptor could not be understood.
    #[error("Invalid mount definition for '{path}': {message}")]
    InvalidMount { path: String, message: String },

    /// Publishing build output (web root, shared mounts) failed.
    #[error("Failed to publish app '{app}' at {}: {message}", path.display())]
    Publish {
        app: String,
        path: PathBuf,
        message: String,
    },

    /// Preparing the private build directory failed.
    #[error("Failed to prepare build directory for app '{app}': {message}")]
    Staging { app: String, message: String },

    /// A subprocess was terminated because of a timeout or cancellation.
    #[error("Command cancelled: {command}")]
    Cancelled { command: String },

    /// A subprocess could not be started at all.
    #[error("Failed to run `{command}`: {message}")]
    CommandSpawn { command: String, message: String },

    /// The build stopped after the first failing application.
    #[error("Build aborted after app '{app}' failed: {message}")]
    BuildAborted { app: String, message: String },

    /// Tool configuration is unusable.
    ///
    /// Optionally carries a hint about how to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_descriptor_parse() {
        let error = Error::DescriptorParse {
            path: PathBuf::from("/repo/api/.platform.app.yaml"),
            message: "mapping values are not allowed here".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Failed to parse application descriptor"));
        assert!(display.contains("/repo/api/.platform.app.yaml"));
        assert!(display.contains("mapping values"));
    }

    #[test]
    fn test_error_display_dependency_install() {
        let error = Error::DependencyInstall {
            app: "api".to_string(),
            command: "composer install".to_string(),
            exit_code: Some(2),
            stderr: "Your requirements could not be resolved\n".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("app 'api'"));
        assert!(display.contains("`composer install` exited with 2"));
        assert!(display.ends_with("Your requirements could not be resolved"));
    }

    #[test]
    fn test_error_display_dependency_install_signal() {
        let error = Error::DependencyInstall {
            app: "web".to_string(),
            command: "npm ci".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert_eq!(
            error.to_string(),
            "Dependency installation failed for app 'web': `npm ci` exited with a signal"
        );
    }

    #[test]
    fn test_error_display_mount_not_found() {
        let error = Error::MountNotFound {
            path: "fils".to_string(),
            available: vec!["files".to_string(), "tmp".to_string()],
        };
        insta::assert_snapshot!(error.to_string(), @"Mount not found: fils (available: files, tmp)");
    }

    #[test]
    fn test_error_display_mount_not_found_without_mounts() {
        let error = Error::MountNotFound {
            path: "files".to_string(),
            available: vec![],
        };
        assert_eq!(error.to_string(), "Mount not found: files");
    }

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "max_depth must be at least 1".to_string(),
            hint: Some("Set max_depth in config.yaml".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("hint: Set max_depth"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(error.to_string().contains("YAML parsing error"));
    }
}
