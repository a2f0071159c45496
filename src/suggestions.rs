//! # Error Suggestions
//!
//! Helpers for user-facing errors that say what went wrong and how to fix
//! it. Library errors stay typed ([`crate::error::Error`]); the commands
//! translate the common user mistakes through these functions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use local_build::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Mount not found: {}", path);
//!
//! // Use:
//! return Err(suggestions::mount_not_found(path, &available));
//! ```

use std::path::Path;

/// Generate an error for a repository without applications.
///
/// Includes hints about the descriptor file and search depth.
pub fn no_applications(root: &Path, app_config_file: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "No applications found in {root}\n\n\
         hint: Add a {app_config_file} file at the root of each application\n\
         hint: Declare several applications in .platform/applications.yaml\n\
         hint: Raise max_depth in your config.yaml if applications are nested deeply",
        root = root.display()
    )
}

/// Generate an error for an explicitly given configuration file that
/// does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Omit --config to use the default location\n\
         hint: Unset the LOCAL_BUILD_CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for a mount path that matches no declared mount.
pub fn mount_not_found(path: &str, available: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = available.iter().map(String::as_str).collect();
    let did_you_mean = did_you_mean(path.trim_matches('/'), &candidates);
    let listing = if available.is_empty() {
        "hint: This application declares no mounts".to_string()
    } else {
        format!("Declared mounts are: {}", available.join(", "))
    };

    anyhow::anyhow!("Mount not found: {path}{did_you_mean}\n\n{listing}")
}

/// Generate an error for an application id that does not exist.
pub fn unknown_application(id: &str, available: &[&str]) -> anyhow::Error {
    let did_you_mean = did_you_mean(id, available);
    anyhow::anyhow!(
        "Unknown application: {id}{did_you_mean}\n\n\
         Applications are: {apps}\n\
         hint: Run 'local-build apps' to list applications",
        apps = available.join(", ")
    )
}

/// Generate an error for an unknown local sub-directory name.
pub fn unknown_subdir(name: &str, available: &[&str]) -> anyhow::Error {
    let did_you_mean = did_you_mean(name, available);
    anyhow::anyhow!(
        "Unknown directory: {name}{did_you_mean}\n\n\
         Valid directories are: {dirs}",
        dirs = available.join(", ")
    )
}

fn did_you_mean(input: &str, candidates: &[&str]) -> String {
    find_similar(input, candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default()
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }
    previous[b.len()]
}
