//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, a scripted command runner and
//! descriptor snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_app("web", descriptors::NODEJS);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::sync::Mutex;

use local_build::process::{CommandOutput, CommandRunner, CommandSpec};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::descriptors;
    #[allow(unused_imports)]
    pub use super::ScriptedRunner;
    pub use super::TestFixture;
}

/// Common application descriptor snippets for testing.
#[allow(dead_code)]
pub mod descriptors {
    /// Symfony application on PHP 7.0.
    pub const SYMFONY: &str = r#"
name: api
type: "php:7.0"
build:
  flavor: symfony
web:
  locations:
    "/":
      root: web
      passthru: /app.php
mounts:
  "/var/sessions": "shared:files/sessions"
"#;

    /// Node.js application on version 10.
    pub const NODEJS: &str = r#"
name: web
type: nodejs:10
web:
  locations:
    "/":
      root: public
"#;

    /// Static content with an unknown runtime.
    pub const STATIC: &str = r#"
name: docs
type: "cobol:1"
web:
  locations:
    "/":
      root: site
"#;

    /// Node.js application with a build hook.
    pub const WITH_HOOK: &str = r#"
name: hooked
type: nodejs:10
hooks:
  build: "echo built > public/hook.txt"
web:
  locations:
    "/":
      root: public
"#;

    /// Not valid YAML.
    pub const INVALID_YAML: &str = "name: [unclosed";
}

/// A command runner that records commands instead of spawning them.
///
/// Commands whose rendered form starts with a registered failing prefix
/// exit with status 1; every other command succeeds.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failing: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make commands starting with `prefix` fail.
    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    /// Every command run so far, rendered as a shell line.
    pub fn rendered(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("runner lock")
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// The working directories of every command run so far.
    pub fn working_dirs(&self) -> Vec<std::path::PathBuf> {
        self.calls
            .lock()
            .expect("runner lock")
            .iter()
            .map(|c| c.working_dir.clone())
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandSpec) -> local_build::Result<CommandOutput> {
        self.calls
            .lock()
            .expect("runner lock")
            .push(command.clone());
        let rendered = command.to_string();
        if self.failing.iter().any(|p| rendered.starts_with(p.as_str())) {
            return Ok(CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: format!("{} exploded", command.program),
            });
        }
        Ok(CommandOutput {
            exit_code: Some(0),
            ..CommandOutput::default()
        })
    }
}

/// A test fixture that provides a temporary project directory.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_app("web", descriptors::NODEJS)
///     .with_file("web/public/index.html", "hello world");
///
/// fixture.command().arg("apps").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add an application descriptor at `dir` (empty for the project root).
    pub fn with_app(self, dir: &str, descriptor: &str) -> Self {
        let path = if dir.is_empty() {
            ".platform.app.yaml".to_string()
        } else {
            format!("{}/.platform.app.yaml", dir)
        };
        self.with_file(&path, descriptor)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add the two-application `api/` + `web/` project.
    pub fn with_api_and_web(self) -> Self {
        self.with_app("api", descriptors::SYMFONY)
            .with_file("api/composer.json", "{}")
            .with_file("api/composer.lock", "{}")
            .with_file("api/web/app.php", "<?php echo 'api';")
            .with_app("web", descriptors::NODEJS)
            .with_file("web/package.json", "{}")
            .with_file("web/package-lock.json", "{}")
            .with_file("web/public/index.html", "<h1>web</h1>")
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command running against this fixture.
    ///
    /// The user configuration directory is redirected into the fixture so
    /// the developer's own configuration never leaks into tests.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("local-build");
        cmd.current_dir(self.path())
            .env_remove("LOCAL_BUILD_CONFIG")
            .env_remove("RUST_LOG")
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_app() {
        let fixture = TestFixture::new().with_app("web", descriptors::NODEJS);
        assert!(fixture.path().join("web/.platform.app.yaml").exists());
    }

    #[test]
    fn test_descriptors_are_valid_yaml() {
        for descriptor in [
            descriptors::SYMFONY,
            descriptors::NODEJS,
            descriptors::STATIC,
            descriptors::WITH_HOOK,
        ] {
            let parsed: Result<serde_yaml::Value, _> = serde_yaml::from_str(descriptor);
            assert!(parsed.is_ok(), "Invalid descriptor: {}", descriptor);
        }
    }
}
