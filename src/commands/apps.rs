//! # Apps Command Implementation
//!
//! This module implements the `apps` subcommand, which lists the
//! applications discovered in the project.
//!
//! ## Functionality
//!
//! - **Application Listing**: Shows each application's id, type, flavor and path
//! - **Tree View**: `--tree` displays nested applications under their parents
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use local_build::flavor::FlavorRegistry;
use local_build::locator::{Application, Locator};

use super::{user_error, GlobalOptions};

/// List the applications of the project
#[derive(Args, Debug)]
pub struct AppsArgs {
    /// Display nested applications as a tree.
    #[arg(long)]
    pub tree: bool,
}

/// Execute the `apps` command.
pub fn execute(args: AppsArgs, global: &GlobalOptions) -> Result<()> {
    let project_root = global.project_root()?;
    let config = global.load_config(&project_root)?;
    let applications = Locator::new(&config)
        .and_then(|locator| locator.locate(&project_root))
        .map_err(|e| user_error(e, &project_root))?;

    if applications.is_empty() {
        println!(
            "No applications found in {}; the project builds as static content.",
            project_root.display()
        );
        return Ok(());
    }

    let registry = FlavorRegistry::with_defaults();
    if args.tree {
        let root = build_tree(&project_root, &applications, &registry);
        print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    } else {
        for app in &applications {
            println!("{}", describe(app, &registry));
        }
    }
    Ok(())
}

/// One line per application: id, type, flavor and path
fn describe(app: &Application, registry: &FlavorRegistry) -> String {
    let app_type = app
        .app_type()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    let path = if app.relative_path().is_empty() {
        "."
    } else {
        app.relative_path()
    };
    format!(
        "{}\t{}\t{}\t{}",
        app.id(),
        app_type,
        registry.resolve_application(app).name(),
        path
    )
}

/// Build the tree of applications, nesting each one under the closest
/// application whose root contains it
fn build_tree(project_root: &Path, applications: &[Application], registry: &FlavorRegistry) -> TreeNode {
    let top_level: Vec<&Application> = applications
        .iter()
        .filter(|app| parent_of(app, applications).is_none())
        .collect();
    TreeNode {
        label: project_root.display().to_string(),
        children: top_level
            .into_iter()
            .map(|app| app_node(app, applications, registry))
            .collect(),
    }
}

fn app_node(app: &Application, applications: &[Application], registry: &FlavorRegistry) -> TreeNode {
    let children = applications
        .iter()
        .filter(|other| {
            parent_of(other, applications).is_some_and(|parent| parent.root() == app.root())
        })
        .map(|child| app_node(child, applications, registry))
        .collect();
    TreeNode {
        label: describe(app, registry).replace('\t', " "),
        children,
    }
}

/// The innermost application whose nested roots include `app`
fn parent_of<'a>(app: &Application, applications: &'a [Application]) -> Option<&'a Application> {
    applications
        .iter()
        .filter(|candidate| candidate.nested_roots().iter().any(|r| r == app.root()))
        .max_by_key(|candidate| candidate.root().components().count())
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
