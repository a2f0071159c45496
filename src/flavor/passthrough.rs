//! Pass-through flavor for static or unrecognized applications

use super::{BuildContext, BuildFlavor};
use crate::error::Result;

/// Installs nothing; the staged source is the build
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughFlavor;

impl BuildFlavor for PassthroughFlavor {
    fn name(&self) -> &'static str {
        "none"
    }

    fn keys(&self) -> &'static [&'static str] {
        &["none"]
    }

    fn stacks(&self) -> &'static [&'static str] {
        &[]
    }

    fn install(&self, context: &mut BuildContext<'_>) -> Result<()> {
        log::debug!("[{}] Nothing to install", context.app_id());
        Ok(())
    }
}
