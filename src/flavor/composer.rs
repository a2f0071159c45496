//! Generic PHP flavor: `composer install`

use super::{BuildContext, BuildFlavor};
use crate::error::Result;

const MANIFEST: &str = "composer.json";
const LOCK_FILE: &str = "composer.lock";

/// Installs PHP dependencies with Composer
#[derive(Debug, Default, Clone, Copy)]
pub struct ComposerFlavor;

impl BuildFlavor for ComposerFlavor {
    fn name(&self) -> &'static str {
        "composer"
    }

    fn keys(&self) -> &'static [&'static str] {
        &["php", "composer", "default"]
    }

    fn stacks(&self) -> &'static [&'static str] {
        &["php"]
    }

    fn install(&self, context: &mut BuildContext<'_>) -> Result<()> {
        if context.settings().no_deps {
            context.info("Skipping Composer dependencies (no-deps)");
            return Ok(());
        }
        if !context.build_dir().join(MANIFEST).is_file() {
            context.info(format!("No {} found, skipping Composer", MANIFEST));
            return Ok(());
        }

        let ignore_lock = context.settings().ignore_lock;
        let verb = if ignore_lock { "update" } else { "install" };
        let composer = context.config().tools.composer.clone();

        if !ignore_lock && !context.build_dir().join(LOCK_FILE).is_file() {
            context.missing_lock(&format!("{} {}", composer, verb), LOCK_FILE)?;
        }

        let command = context.command(&composer).arg(verb).args([
            "--no-progress",
            "--prefer-dist",
            "--optimize-autoloader",
            "--no-interaction",
        ]);
        context.install(command)
    }
}
