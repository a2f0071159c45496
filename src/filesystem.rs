//! Filesystem helpers for staging and publishing builds
//!
//! Recursive copy with an exclusion filter, removal that does not follow
//! symlinks, symlink creation with a copy fallback, and an atomic "replace
//! this path" primitive used to publish output without ever leaving a
//! half-written destination behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// How a path was published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    Symlinked,
    Copied,
}

/// Whether anything exists at `path`, including a dangling symlink
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Remove whatever is at `path`: file, symlink or directory tree.
///
/// Symlinks are removed themselves, never followed. A missing path is not an
/// error.
pub fn remove(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        remove_file_or_link(path)?;
    }
    Ok(())
}

#[cfg(windows)]
fn remove_file_or_link(path: &Path) -> io::Result<()> {
    // Directory symlinks on Windows are removed with remove_dir.
    fs::remove_file(path).or_else(|_| fs::remove_dir(path))
}

#[cfg(not(windows))]
fn remove_file_or_link(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// Recursively copy `source` into `dest`.
///
/// `skip` is called with every entry path below `source`; returning `true`
/// leaves the entry (and, for a directory, everything under it) out. Symlinks
/// are copied as symlinks. Existing files in `dest` are overwritten; files
/// only present in `dest` are left alone.
pub fn copy_all<F>(source: &Path, dest: &Path, skip: F) -> Result<usize>
where
    F: Fn(&Path) -> bool,
{
    fs::create_dir_all(dest)?;
    let mut copied = 0;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !skip(entry.path()));

    for entry in walker {
        let entry = entry.map_err(|e| Error::Io(io::Error::other(e.to_string())))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Io(io::Error::other(e.to_string())))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            remove(&target)?;
            create_symlink(&link, &target)?;
        } else if file_type.is_dir() {
            if fs::symlink_metadata(&target).is_ok_and(|m| !m.is_dir()) {
                remove(&target)?;
            }
            fs::create_dir_all(&target)?;
        } else {
            if fs::symlink_metadata(&target).is_ok_and(|m| !m.is_file()) {
                remove(&target)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Create a symlink at `link` pointing to `target`.
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }
    #[cfg(windows)]
    {
        let resolved = link.parent().map(|p| p.join(target)).unwrap_or_else(|| target.to_path_buf());
        if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, link);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "symlinks are not supported on this platform",
        ))
    }
}

/// Replace whatever is at `dest` with a link to (or copy of) `source`.
///
/// The new entry is prepared at a temporary sibling and renamed into place,
/// so a failure part-way leaves the previous `dest` untouched. When
/// `copy` is false a symlink is attempted first (relative unless
/// `absolute`), falling back to a copy if the platform refuses symlinks.
pub fn publish(source: &Path, dest: &Path, copy: bool, absolute: bool) -> Result<Publication> {
    let parent = dest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent)?;

    let staging = staging_sibling(dest);
    remove(&staging)?;

    let publication = if copy {
        copy_all(source, &staging, |_| false)?;
        Publication::Copied
    } else {
        let target = if absolute {
            source.to_path_buf()
        } else {
            crate::path::relative_to(source, &parent)
        };
        match create_symlink(&target, &staging) {
            Ok(()) => Publication::Symlinked,
            Err(e) => {
                log::debug!(
                    "Symlink {} -> {} failed ({}), copying instead",
                    staging.display(),
                    target.display(),
                    e
                );
                copy_all(source, &staging, |_| false)?;
                Publication::Copied
            }
        }
    };

    if let Err(e) = swap_into_place(&staging, dest) {
        let _ = remove(&staging);
        return Err(e);
    }
    Ok(publication)
}

/// Move `staging` to `dest`, replacing what was there.
fn swap_into_place(staging: &Path, dest: &Path) -> Result<()> {
    match fs::rename(staging, dest) {
        Ok(()) => Ok(()),
        Err(_) if exists(dest) => {
            // rename() cannot replace a non-empty directory.
            remove(dest)?;
            fs::rename(staging, dest)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn staging_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".publishing");
    path.with_file_name(name)
}
