//! Drupal: site scaffolding, then Composer

use std::fs;

use super::scaffold::{merge_gitignore, DRUPAL_GITIGNORE};
use super::{BuildContext, BuildFlavor, ComposerFlavor};
use crate::error::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct DrupalFlavor {
    parent: ComposerFlavor,
}

impl DrupalFlavor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BuildFlavor for DrupalFlavor {
    fn name(&self) -> &'static str {
        "drupal"
    }

    fn keys(&self) -> &'static [&'static str] {
        &["drupal"]
    }

    fn stacks(&self) -> &'static [&'static str] {
        self.parent.stacks()
    }

    fn parent(&self) -> Option<&dyn BuildFlavor> {
        Some(&self.parent)
    }

    fn install(&self, context: &mut BuildContext<'_>) -> Result<()> {
        context.run_hook("Drupal scaffolding", |context| {
            merge_gitignore(context.build_dir(), DRUPAL_GITIGNORE)?;
            let site_dir = context.document_root()?.join("sites").join("default");
            fs::create_dir_all(&site_dir)?;
            Ok(())
        });
        self.parent.install(context)
    }
}
