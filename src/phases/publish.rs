//! Phase 4: Publish
//!
//! After a successful install, the shared file mounts of the application are
//! linked into its build directory and its document root is published at the
//! project's web root. Publishing an application only ever touches that
//! application's own output paths.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::filesystem::{self, Publication};
use crate::flavor::BuildContext;
use crate::mounts::shared_file_mounts;
use crate::path::relative_to;

/// Make `web_root` usable as the parent of per-application web roots.
///
/// A link or file left there by a previous single-application build is
/// removed so that nothing gets written through it.
pub fn prepare_web_root_parent(web_root: &Path) -> Result<()> {
    let is_dir = fs::symlink_metadata(web_root)
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false);
    if !is_dir {
        filesystem::remove(web_root)?;
        fs::create_dir_all(web_root)?;
    }
    Ok(())
}

/// Replace each shared mount target in the build directory with a link to
/// its storage under `shared_dir`.
///
/// Links are relative unless `abslinks` or `copy` is set.
///
/// Returns the linked mount paths.
pub fn link_shared_mounts(context: &mut BuildContext<'_>, shared_dir: &Path) -> Result<Vec<String>> {
    let mounts = context.app().mounts()?;
    let shared = shared_file_mounts(&mounts);
    let mut linked = Vec::new();

    for (mount_path, source_path) in shared {
        let target = context.within_build_dir(&mount_path)?;
        let storage = crate::path::join_contained(shared_dir, &source_path).map_err(|message| {
            Error::Publish {
                app: context.app_id().to_string(),
                path: shared_dir.to_path_buf(),
                message,
            }
        })?;
        let publish_error = |message: String| Error::Publish {
            app: context.app_id().to_string(),
            path: target.clone(),
            message,
        };

        fs::create_dir_all(&storage)
            .map_err(|e| publish_error(format!("cannot create {}: {}", storage.display(), e)))?;
        filesystem::remove(&target).map_err(|e| publish_error(e.to_string()))?;
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| context.build_dir().to_path_buf());
        fs::create_dir_all(&parent).map_err(|e| publish_error(e.to_string()))?;

        let settings = context.settings();
        let link = if settings.abslinks || settings.copy {
            storage.clone()
        } else {
            relative_to(&storage, &parent)
        };
        filesystem::create_symlink(&link, &target)
            .map_err(|e| publish_error(format!("cannot link shared mount: {}", e)))?;

        context.info(format!(
            "Linked mount '{}' to {}",
            mount_path,
            storage.display()
        ));
        linked.push(mount_path);
    }
    Ok(linked)
}

/// Publish the document root of the build at `dest`.
///
/// Returns `None`, with a warning, when the build has no document root.
pub fn publish_web_root(context: &mut BuildContext<'_>, dest: &Path) -> Result<Option<PathBuf>> {
    let document_root = context.document_root()?;
    if !document_root.is_dir() {
        context.warn(format!(
            "Document root {} does not exist, nothing published",
            document_root.display()
        ));
        return Ok(None);
    }

    let settings = context.settings();
    let publication = filesystem::publish(&document_root, dest, settings.copy, settings.abslinks)
        .map_err(|e| Error::Publish {
            app: context.app_id().to_string(),
            path: dest.to_path_buf(),
            message: e.to_string(),
        })?;

    let how = match publication {
        Publication::Symlinked => "Linked",
        Publication::Copied => "Copied",
    };
    context.info(format!("{} web root to {}", how, dest.display()));
    Ok(Some(dest.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildSettings, LocalConfig};
    use crate::locator::Application;
    use crate::process::testing::MockRunner;
    use tempfile::TempDir;

    fn app(root: &Path, yaml: &str) -> Application {
        let mut app = Application::implicit(root);
        app.set_config(serde_yaml::from_str(yaml).unwrap()).unwrap();
        app
    }

    #[cfg(unix)]
    #[test]
    fn test_link_shared_mounts() {
        let temp = TempDir::new().unwrap();
        let build_dir = temp.path().join("local/builds/default");
        fs::create_dir_all(build_dir.join("public/sites/default/files")).unwrap();
        fs::write(build_dir.join("public/sites/default/files/source.txt"), "x").unwrap();
        let app = app(
            temp.path(),
            "mounts:\n  '/public/sites/default/files': 'shared:files/files'\n  '/cache': {source: tmp}\n",
        );
        let (settings, config, runner) =
            (BuildSettings::default(), LocalConfig::default(), MockRunner::new());
        let mut context = BuildContext::new(&app, build_dir.clone(), &settings, &config, &runner);

        let shared = temp.path().join("local/shared");
        let linked = link_shared_mounts(&mut context, &shared).unwrap();

        assert_eq!(linked, vec!["public/sites/default/files"]);
        let target = build_dir.join("public/sites/default/files");
        assert!(fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_link(&target).unwrap(),
            PathBuf::from("../../../../../shared/files")
        );
        assert!(shared.join("files").is_dir());
        assert!(!build_dir.join("cache").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_link_shared_mounts_absolute_when_copying() {
        let temp = TempDir::new().unwrap();
        let build_dir = temp.path().join("local/builds/default");
        fs::create_dir_all(&build_dir).unwrap();
        let app = app(temp.path(), "mounts:\n  '/public/files': 'shared:files/files'\n");
        let settings = BuildSettings {
            copy: true,
            ..BuildSettings::default()
        };
        let (config, runner) = (LocalConfig::default(), MockRunner::new());
        let mut context = BuildContext::new(&app, build_dir.clone(), &settings, &config, &runner);

        let shared = temp.path().join("local/shared");
        link_shared_mounts(&mut context, &shared).unwrap();

        assert_eq!(
            fs::read_link(build_dir.join("public/files")).unwrap(),
            shared.join("files")
        );
    }

    #[test]
    fn test_link_shared_mounts_refuses_paths_outside_build_dir() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("source");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("index.html"), "keep").unwrap();
        let build_dir = temp.path().join("builds/default");
        fs::create_dir_all(&build_dir).unwrap();
        let app = app(temp.path(), "mounts:\n  '../../source': 'shared:files/x'\n");
        let (settings, config, runner) =
            (BuildSettings::default(), LocalConfig::default(), MockRunner::new());
        let mut context = BuildContext::new(&app, build_dir, &settings, &config, &runner);

        let err = link_shared_mounts(&mut context, &temp.path().join("shared")).unwrap_err();
        assert!(matches!(err, Error::InvalidMount { .. }));
        assert!(outside.join("index.html").is_file());
    }

    #[test]
    fn test_publish_missing_document_root_warns() {
        let temp = TempDir::new().unwrap();
        let app = app(temp.path(), "web: {locations: {'/': {root: public}}}\n");
        let (settings, config, runner) =
            (BuildSettings::default(), LocalConfig::default(), MockRunner::new());
        let mut context =
            BuildContext::new(&app, temp.path().join("build"), &settings, &config, &runner);

        let published = publish_web_root(&mut context, &temp.path().join("_www")).unwrap();
        assert!(published.is_none());
        assert_eq!(context.diagnostics().len(), 1);
    }

    #[test]
    fn test_publish_copy() {
        let temp = TempDir::new().unwrap();
        let build_dir = temp.path().join("build");
        fs::create_dir_all(build_dir.join("public")).unwrap();
        fs::write(build_dir.join("public/index.html"), "hi").unwrap();
        let app = app(temp.path(), "web: {document_root: public}\n");
        let settings = BuildSettings {
            copy: true,
            ..BuildSettings::default()
        };
        let (config, runner) = (LocalConfig::default(), MockRunner::new());
        let mut context = BuildContext::new(&app, build_dir, &settings, &config, &runner);

        let dest = temp.path().join("_www");
        assert_eq!(publish_web_root(&mut context, &dest).unwrap(), Some(dest.clone()));
        assert!(fs::symlink_metadata(&dest).unwrap().is_dir());
        assert_eq!(fs::read_to_string(dest.join("index.html")).unwrap(), "hi");
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_web_root_parent_replaces_link() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("old-build");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.txt"), "keep").unwrap();
        let web_root = temp.path().join("_www");
        filesystem::create_symlink(&target, &web_root).unwrap();

        prepare_web_root_parent(&web_root).unwrap();
        assert!(fs::symlink_metadata(&web_root).unwrap().is_dir());
        assert!(target.join("keep.txt").is_file());
    }
}
