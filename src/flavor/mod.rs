//! # Build Flavors
//!
//! A flavor is the ecosystem-specific way of preparing an application for
//! serving: which package manager to run, which scaffold files to seed.
//!
//! ## Resolution
//!
//! Every flavor answers to a set of *keys* (`composer`, `symfony`, `default`,
//! ...) and serves a set of *stacks* (ecosystems such as `php`; empty means
//! any). For an application, the key is its explicit `build.flavor`, or
//! `default` when none is declared, and the stack is the alias-normalized
//! ecosystem of its `type`. The first registered flavor matching both wins.
//! If nothing matches, the pass-through flavor is used and an `info` line is
//! logged: unknown types degrade to static content instead of failing.
//!
//! ## Extension
//!
//! A specialized flavor owns its parent and calls the parent's `install`
//! explicitly, adding its own steps before or after. Dependency installation
//! itself is never re-implemented by a child.
//!
//! The [`FlavorRegistry`] is an ordinary value: build one with
//! [`FlavorRegistry::with_defaults`] at startup and pass it to the
//! orchestrator.

use std::fmt;
use std::sync::Arc;

use crate::defaults::DEFAULT_FLAVOR_KEY;
use crate::descriptor::AppType;
use crate::error::Result;
use crate::locator::Application;

pub mod composer;
pub mod context;
pub mod drupal;
pub mod nodejs;
pub mod passthrough;
pub mod scaffold;
pub mod symfony;

pub use composer::ComposerFlavor;
pub use context::BuildContext;
pub use drupal::DrupalFlavor;
pub use nodejs::NodeJsFlavor;
pub use passthrough::PassthroughFlavor;
pub use symfony::SymfonyFlavor;

/// An ecosystem-specific build strategy
pub trait BuildFlavor: Send + Sync + fmt::Debug {
    /// Name recorded in build metadata and shown to users
    fn name(&self) -> &'static str;

    /// Flavor keys this flavor answers to
    fn keys(&self) -> &'static [&'static str];

    /// Ecosystems this flavor may serve; empty for any
    fn stacks(&self) -> &'static [&'static str];

    /// The flavor this one extends, if any
    fn parent(&self) -> Option<&dyn BuildFlavor> {
        None
    }

    /// Install the application's dependencies into the build directory.
    ///
    /// Pre- and post-install steps go through [`BuildContext::run_hook`] so
    /// their failures are warnings; a failing package manager is an error.
    fn install(&self, context: &mut BuildContext<'_>) -> Result<()>;

    /// Whether the flavor serves `ecosystem`
    fn serves(&self, ecosystem: &str) -> bool {
        self.stacks().is_empty() || self.stacks().contains(&ecosystem)
    }

    /// The names of this flavor and its ancestors, most specific first
    fn lineage(&self) -> Vec<&'static str> {
        let mut names = vec![self.name()];
        let mut current = self.parent();
        while let Some(flavor) = current {
            names.push(flavor.name());
            current = flavor.parent();
        }
        names
    }
}

/// Explicit table of the available flavors
#[derive(Debug, Clone)]
pub struct FlavorRegistry {
    flavors: Vec<Arc<dyn BuildFlavor>>,
    fallback: Arc<dyn BuildFlavor>,
}

impl Default for FlavorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FlavorRegistry {
    /// A registry that resolves everything to pass-through
    pub fn new() -> Self {
        Self {
            flavors: Vec::new(),
            fallback: Arc::new(PassthroughFlavor),
        }
    }

    /// A registry with the built-in flavors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ComposerFlavor));
        registry.register(Arc::new(SymfonyFlavor::new()));
        registry.register(Arc::new(DrupalFlavor::new()));
        registry.register(Arc::new(NodeJsFlavor));
        registry.register(Arc::new(PassthroughFlavor));
        registry
    }

    /// Add a flavor; earlier registrations take precedence
    pub fn register(&mut self, flavor: Arc<dyn BuildFlavor>) {
        log::debug!(
            "Registered flavor '{}' (keys: {}, stacks: {})",
            flavor.name(),
            flavor.keys().join(", "),
            if flavor.stacks().is_empty() {
                "any".to_string()
            } else {
                flavor.stacks().join(", ")
            }
        );
        self.flavors.push(flavor);
    }

    /// Registered flavors in precedence order
    pub fn flavors(&self) -> &[Arc<dyn BuildFlavor>] {
        &self.flavors
    }

    /// Resolve a `"<ecosystem>[:<version>]"` type string with no explicit
    /// flavor
    pub fn resolve(&self, type_string: &str) -> Arc<dyn BuildFlavor> {
        self.resolve_with(Some(&AppType::parse(type_string)), None)
    }

    /// Resolve a type and an optional explicit `build.flavor`
    pub fn resolve_with(
        &self,
        app_type: Option<&AppType>,
        flavor: Option<&str>,
    ) -> Arc<dyn BuildFlavor> {
        let key = flavor
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_FLAVOR_KEY);
        let ecosystem = app_type.map(|t| t.ecosystem.as_str()).unwrap_or("");

        let found = self
            .flavors
            .iter()
            .find(|f| f.keys().contains(&key) && f.serves(ecosystem));

        match found {
            Some(flavor) => Arc::clone(flavor),
            None => {
                log::info!(
                    "No build flavor for type '{}' and flavor '{}', using pass-through",
                    app_type.map(ToString::to_string).unwrap_or_default(),
                    key
                );
                Arc::clone(&self.fallback)
            }
        }
    }

    /// Resolve the flavor of a discovered application
    pub fn resolve_application(&self, app: &Application) -> Arc<dyn BuildFlavor> {
        let app_type = app.app_type();
        self.resolve_with(app_type.as_ref(), app.descriptor().flavor())
    }
}
