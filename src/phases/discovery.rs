//! Phase 1: Discovery
//!
//! Locates the applications of the repository and falls back to the
//! implicit root application when there are none (unless applications are
//! required). [`select`] then narrows the list to the requested ids.

use std::path::Path;

use crate::config::{BuildSettings, LocalConfig};
use crate::error::{Error, Result};
use crate::locator::{Application, Locator};

/// Execute Phase 1: return every application of the repository, in
/// discovery order
pub fn execute(
    repository_root: &Path,
    config: &LocalConfig,
    settings: &BuildSettings,
) -> Result<Vec<Application>> {
    let mut applications = Locator::new(config)?.locate(repository_root)?;

    if applications.is_empty() {
        if settings.require_applications {
            return Err(Error::NoApplicationsFound {
                root: repository_root.to_path_buf(),
            });
        }
        log::info!(
            "No application descriptor found in {}, building the repository as static content",
            repository_root.display()
        );
        applications.push(Application::implicit(&std::fs::canonicalize(
            repository_root,
        )?));
    }

    Ok(applications)
}

/// Keep only the applications named in `only`; all of them when empty
pub fn select(applications: Vec<Application>, only: &[String]) -> Result<Vec<Application>> {
    if only.is_empty() {
        return Ok(applications);
    }
    if let Some(unknown) = only
        .iter()
        .find(|id| !applications.iter().any(|app| app.id() == id.as_str()))
    {
        let available: Vec<&str> = applications.iter().map(Application::id).collect();
        return Err(Error::Config {
            message: format!("Unknown application '{}'", unknown),
            hint: Some(format!("Available applications: {}", available.join(", "))),
        });
    }
    Ok(applications
        .into_iter()
        .filter(|app| only.iter().any(|id| id == app.id()))
        .collect())
}
