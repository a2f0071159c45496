//! Path manipulation utilities for local-build

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use glob::Pattern;
use regex::Regex;

use crate::error::{Error, Result};

/// Normalize an application-relative path.
///
/// Strips leading and trailing slashes (and surrounding whitespace), so
/// `"/public/files/"` becomes `"public/files"`. Applying it twice is the
/// same as applying it once.
pub fn normalize_relative(path: &str) -> String {
    path.trim_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

/// Normalize an application-relative path that must stay below its base.
///
/// Like [`normalize_relative`], but every remaining component has to be a
/// plain name: `.`, `..`, empty components and platform prefixes are
/// rejected with a message. The empty path (the base itself) is accepted.
pub fn contained_relative(path: &str) -> std::result::Result<String, String> {
    let normalized = normalize_relative(path);
    if normalized.is_empty() {
        return Ok(normalized);
    }
    for part in normalized.split('/') {
        let mut components = Path::new(part).components();
        let plain = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !plain {
            return Err(format!(
                "'{}' must stay inside the application ('{}' is not allowed)",
                path, part
            ));
        }
    }
    Ok(normalized)
}

/// Join an application-relative path onto `base`, refusing any path that
/// would resolve outside of it.
pub fn join_contained(base: &Path, relative: &str) -> std::result::Result<PathBuf, String> {
    let relative = contained_relative(relative)?;
    if relative.is_empty() {
        Ok(base.to_path_buf())
    } else {
        Ok(base.join(relative))
    }
}

/// Turn an application id into a name safe for a single directory component.
///
/// Every run of characters outside `[a-zA-Z0-9-_.]` collapses into a single
/// `-`, and leading/trailing dashes are dropped.
pub fn slugify(id: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars =
        UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_.\-]+").expect("valid slug regex"));
    let slug = unsafe_chars.replace_all(id, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() || slug == "." || slug == ".." {
        crate::defaults::DEFAULT_APP_ID.to_string()
    } else {
        slug.to_string()
    }
}

/// Compile directory-name glob patterns
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(Error::Glob))
        .collect()
}

/// Whether a single file name matches any of the given patterns
pub fn name_matches(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

/// Compute the path of `target` relative to the directory `base`.
///
/// Both paths must be absolute (or both relative to the same directory).
/// Used to create relative symlinks, so that a project directory can be
/// moved without breaking its published web root.
pub fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = target.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Render a repository-relative path with forward slashes.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
