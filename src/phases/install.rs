//! Phase 3: Install
//!
//! Runs inside the staged build directory, in this order:
//! 1. Global dependencies declared under `dependencies:` in the descriptor,
//!    installed per ecosystem into `<local>/deps/<app>/<ecosystem>`, with
//!    their executables put on `PATH`. Variables such as `COMPOSER_HOME`
//!    only apply to the global install command itself.
//! 2. The flavor's install sequence.
//! 3. The descriptor's `hooks.build` script, through the configured shell.
//!
//! Any step that fails stops the application's build.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::flavor::{BuildContext, BuildFlavor};
use crate::process::CommandSpec;

/// Execute Phase 3 for one application
pub fn execute(
    context: &mut BuildContext<'_>,
    flavor: &dyn BuildFlavor,
    deps_dir: &Path,
) -> Result<()> {
    install_global_dependencies(context, deps_dir)?;

    log::debug!(
        "[{}] Installing with flavor '{}'",
        context.app_id(),
        flavor.lineage().join(" < ")
    );
    flavor.install(context)?;

    run_build_hook(context)
}

/// Install the descriptor's global dependencies.
///
/// `deps_dir` is this application's own dependency directory.
pub fn install_global_dependencies(context: &mut BuildContext<'_>, deps_dir: &Path) -> Result<()> {
    let dependencies = context.app().descriptor().dependencies().clone();
    if dependencies.is_empty() {
        return Ok(());
    }
    if context.settings().no_deps {
        context.info("Skipping global dependencies (no-deps)");
        return Ok(());
    }

    for (ecosystem, packages) in &dependencies {
        if packages.is_empty() {
            continue;
        }
        let target = deps_dir.join(ecosystem);
        let Some(plan) = GlobalInstall::for_ecosystem(ecosystem, &target, context) else {
            context.warn(format!(
                "Global dependencies for '{}' are not supported, skipping",
                ecosystem
            ));
            continue;
        };

        fs::create_dir_all(&target)?;
        context.info(format!(
            "Installing global {} dependencies: {}",
            ecosystem,
            packages.keys().cloned().collect::<Vec<_>>().join(", ")
        ));
        let command = plan
            .env
            .iter()
            .fold(plan.command(context, packages), |command, (key, value)| {
                command.env(key.clone(), value.clone().into_os_string())
            });
        context.install(command)?;
        context.prepend_path(plan.bin_dir);
    }
    Ok(())
}

/// How one ecosystem installs packages into a private prefix
struct GlobalInstall {
    program: String,
    args: Vec<String>,
    env: Vec<(String, PathBuf)>,
    bin_dir: PathBuf,
    separator: &'static str,
}

impl GlobalInstall {
    fn for_ecosystem(ecosystem: &str, target: &Path, context: &BuildContext<'_>) -> Option<Self> {
        let tools = &context.config().tools;
        let target_arg = target.to_string_lossy().into_owned();
        let plan = match ecosystem {
            "nodejs" => Self {
                program: tools.npm.clone(),
                args: vec!["install".into(), "--global".into(), "--prefix".into(), target_arg],
                env: Vec::new(),
                bin_dir: target.join("bin"),
                separator: "@",
            },
            "php" => Self {
                program: tools.composer.clone(),
                args: vec![
                    "global".into(),
                    "require".into(),
                    "--no-progress".into(),
                    "--no-interaction".into(),
                ],
                env: vec![("COMPOSER_HOME".to_string(), target.to_path_buf())],
                bin_dir: target.join("vendor").join("bin"),
                separator: ":",
            },
            "python" => Self {
                program: tools.pip.clone(),
                args: vec!["install".into(), "--user".into()],
                env: vec![("PYTHONUSERBASE".to_string(), target.to_path_buf())],
                bin_dir: target.join("bin"),
                separator: "==",
            },
            "ruby" => Self {
                program: tools.gem.clone(),
                args: vec!["install".into(), "--no-document".into()],
                env: vec![("GEM_HOME".to_string(), target.to_path_buf())],
                bin_dir: target.join("bin"),
                separator: ":",
            },
            _ => return None,
        };
        Some(plan)
    }

    fn command(
        &self,
        context: &BuildContext<'_>,
        packages: &std::collections::BTreeMap<String, String>,
    ) -> CommandSpec {
        let specs = packages.iter().map(|(name, version)| {
            let version = version.trim();
            if version.is_empty() || version == "*" {
                name.clone()
            } else {
                format!("{}{}{}", name, self.separator, version)
            }
        });
        context
            .command(&self.program)
            .args(self.args.iter().cloned())
            .args(specs)
    }
}

/// Run `hooks.build` unless `no-build-hooks` is set
pub fn run_build_hook(context: &mut BuildContext<'_>) -> Result<()> {
    let Some(hook) = context.app().descriptor().build_hook().map(str::to_string) else {
        return Ok(());
    };
    if context.settings().no_build_hooks {
        context.info("Skipping build hook (no-build-hooks)");
        return Ok(());
    }

    context.info("Running build hook");
    let shell = context.config().tools.shell.clone();
    let flag = if shell.eq_ignore_ascii_case("cmd") {
        "/C"
    } else {
        "-c"
    };
    let command = context.command(&shell).arg(flag).arg(hook);
    let output = match context.run(command) {
        Ok(output) => output,
        Err(Error::CommandSpawn { message, .. }) => {
            return Err(Error::BuildHook {
                app: context.app_id().to_string(),
                exit_code: None,
                stderr: message,
            })
        }
        Err(e) => return Err(e),
    };
    if output.success() {
        return Ok(());
    }
    Err(Error::BuildHook {
        app: context.app_id().to_string(),
        exit_code: output.exit_code,
        stderr: output.stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildSettings, LocalConfig};
    use crate::flavor::PassthroughFlavor;
    use crate::locator::Application;
    use crate::process::testing::MockRunner;
    use tempfile::TempDir;

    fn app(temp: &TempDir, yaml: &str) -> Application {
        let mut app = Application::implicit(temp.path());
        app.set_config(serde_yaml::from_str(yaml).unwrap()).unwrap();
        app
    }

    #[cfg(unix)]
    #[test]
    fn test_global_dependencies_then_hook() {
        let temp = TempDir::new().unwrap();
        let app = app(
            &temp,
            r#"
name: web
dependencies:
  nodejs:
    gulp: "^3.9"
    bower: "*"
  php:
    drush/drush: "8.*"
hooks:
  build: gulp build
"#,
        );
        let (settings, config, runner) =
            (BuildSettings::default(), LocalConfig::default(), MockRunner::new());
        let deps = temp.path().join("deps");
        let mut context =
            BuildContext::new(&app, temp.path().to_path_buf(), &settings, &config, &runner);

        execute(&mut context, &PassthroughFlavor, &deps).unwrap();

        let rendered = runner.rendered();
        assert_eq!(rendered.len(), 3);
        assert_eq!(
            rendered[0],
            format!(
                "npm install --global --prefix {} bower gulp@^3.9",
                deps.join("nodejs").display()
            )
        );
        assert_eq!(
            rendered[1],
            "composer global require --no-progress --no-interaction drush/drush:8.*"
        );
        assert_eq!(rendered[2], "sh -c 'gulp build'");

        let hook = &runner.calls()[2];
        let path = hook
            .env
            .iter()
            .find(|(k, _)| k == "PATH")
            .map(|(_, v)| v.to_string_lossy().into_owned())
            .unwrap();
        let php_bin = deps.join("php/vendor/bin");
        let node_bin = deps.join("nodejs/bin");
        assert!(path.starts_with(&*php_bin.to_string_lossy()));
        assert!(path.contains(&*node_bin.to_string_lossy()));
        assert!(!hook.env.iter().any(|(k, _)| k == "COMPOSER_HOME"));

        let composer_home = runner.calls()[1]
            .env
            .iter()
            .find(|(k, _)| k == "COMPOSER_HOME")
            .map(|(_, v)| PathBuf::from(v))
            .unwrap();
        assert_eq!(composer_home, deps.join("php"));
    }

    #[test]
    fn test_global_prefix_does_not_leak_into_flavor_install() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("composer.json"), "{}").unwrap();
        std::fs::write(temp.path().join("composer.lock"), "{}").unwrap();
        let app = app(
            &temp,
            "type: php:7.0\ndependencies:\n  php:\n    drush/drush: '8.*'\n",
        );
        let (settings, config, runner) =
            (BuildSettings::default(), LocalConfig::default(), MockRunner::new());
        let deps = temp.path().join("deps");
        let mut context =
            BuildContext::new(&app, temp.path().to_path_buf(), &settings, &config, &runner);

        execute(&mut context, &crate::flavor::ComposerFlavor, &deps).unwrap();

        let calls = runner.calls();
        let install = calls
            .iter()
            .find(|c| c.args.first().map(String::as_str) == Some("install"))
            .unwrap();
        assert!(!install.env.iter().any(|(k, _)| k == "COMPOSER_HOME"));
        assert!(install.env.iter().any(|(k, _)| k == "PATH"));
    }

    #[test]
    fn test_unknown_ecosystem_warns() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp, "dependencies:\n  erlang:\n    rebar: '*'\n");
        let (settings, config, runner) =
            (BuildSettings::default(), LocalConfig::default(), MockRunner::new());
        let mut context =
            BuildContext::new(&app, temp.path().to_path_buf(), &settings, &config, &runner);

        install_global_dependencies(&mut context, &temp.path().join("deps")).unwrap();
        assert!(runner.calls().is_empty());
        assert_eq!(context.diagnostics().len(), 1);
    }

    #[test]
    fn test_no_deps_and_no_build_hooks() {
        let temp = TempDir::new().unwrap();
        let app = app(
            &temp,
            "dependencies:\n  python:\n    mkdocs: '1.0'\nhooks:\n  build: mkdocs build\n",
        );
        let settings = BuildSettings {
            no_deps: true,
            no_build_hooks: true,
            ..BuildSettings::default()
        };
        let (config, runner) = (LocalConfig::default(), MockRunner::new());
        let mut context =
            BuildContext::new(&app, temp.path().to_path_buf(), &settings, &config, &runner);

        execute(&mut context, &PassthroughFlavor, &temp.path().join("deps")).unwrap();
        assert!(runner.calls().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_hook() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp, "name: api\nhooks:\n  build: make\n");
        let (settings, config) = (BuildSettings::default(), LocalConfig::default());
        let runner = MockRunner::new().failing("sh");
        let mut context =
            BuildContext::new(&app, temp.path().to_path_buf(), &settings, &config, &runner);

        match run_build_hook(&mut context).unwrap_err() {
            Error::BuildHook { app, exit_code, .. } => {
                assert_eq!(app, "api");
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failing_global_install_stops() {
        let temp = TempDir::new().unwrap();
        let app = app(
            &temp,
            "dependencies:\n  ruby:\n    sass: '3.4.7'\nhooks:\n  build: sass x\n",
        );
        let (settings, config) = (BuildSettings::default(), LocalConfig::default());
        let runner = MockRunner::new().failing("gem");
        let mut context =
            BuildContext::new(&app, temp.path().to_path_buf(), &settings, &config, &runner);

        let err = execute(&mut context, &PassthroughFlavor, &temp.path().join("deps"))
            .unwrap_err();
        assert!(matches!(err, Error::DependencyInstall { .. }));
        assert_eq!(runner.rendered(), vec!["gem install --no-document sass:3.4.7"]);
    }
}
