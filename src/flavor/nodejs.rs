//! Node.js flavor: `npm ci` / `npm install`

use super::{BuildContext, BuildFlavor};
use crate::error::Result;

const MANIFEST: &str = "package.json";
const LOCK_FILES: &[&str] = &["package-lock.json", "npm-shrinkwrap.json"];

/// Installs Node.js dependencies with npm
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeJsFlavor;

impl BuildFlavor for NodeJsFlavor {
    fn name(&self) -> &'static str {
        "nodejs"
    }

    fn keys(&self) -> &'static [&'static str] {
        &["nodejs", "default"]
    }

    fn stacks(&self) -> &'static [&'static str] {
        &["nodejs"]
    }

    fn install(&self, context: &mut BuildContext<'_>) -> Result<()> {
        if context.settings().no_deps {
            context.info("Skipping npm dependencies (no-deps)");
            return Ok(());
        }
        if !context.build_dir().join(MANIFEST).is_file() {
            context.info(format!("No {} found, skipping npm", MANIFEST));
            return Ok(());
        }

        let npm = context.config().tools.npm.clone();
        let has_lock = LOCK_FILES
            .iter()
            .any(|lock| context.build_dir().join(lock).is_file());

        let command = if has_lock && !context.settings().ignore_lock {
            context.command(&npm).arg("ci")
        } else {
            if !context.settings().ignore_lock {
                context.missing_lock(&format!("{} install", npm), LOCK_FILES[0])?;
            }
            context.command(&npm).arg("install")
        };
        context.install(command)
    }
}
