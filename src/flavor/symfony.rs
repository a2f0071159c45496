//! Symfony: Composer, then the standard Symfony ignore rules

use super::scaffold::{merge_gitignore, SYMFONY_GITIGNORE};
use super::{BuildContext, BuildFlavor, ComposerFlavor};
use crate::error::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct SymfonyFlavor {
    parent: ComposerFlavor,
}

impl SymfonyFlavor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BuildFlavor for SymfonyFlavor {
    fn name(&self) -> &'static str {
        "symfony"
    }

    fn keys(&self) -> &'static [&'static str] {
        &["symfony"]
    }

    fn stacks(&self) -> &'static [&'static str] {
        self.parent.stacks()
    }

    fn parent(&self) -> Option<&dyn BuildFlavor> {
        Some(&self.parent)
    }

    fn install(&self, context: &mut BuildContext<'_>) -> Result<()> {
        self.parent.install(context)?;
        context.run_hook("Seeding Symfony .gitignore", |context| {
            let added = merge_gitignore(context.build_dir(), SYMFONY_GITIGNORE)?;
            if added > 0 {
                context.info(format!("Added {} Symfony ignore rule(s)", added));
            }
            Ok(())
        });
        Ok(())
    }
}
