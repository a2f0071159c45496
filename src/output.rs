//! # Terminal Output
//!
//! Presentation of build progress and results: whether to decorate output
//! with colours and emoji, the spinner shown while applications build, and
//! the rendering of per-application results and the run summary.
//!
//! Decoration follows `--color` first. With `--color=auto` the environment
//! decides: `NO_COLOR` (any value) and `CLICOLOR=0` turn it off,
//! `CLICOLOR_FORCE` turns it on even when piped, `TERM=dumb` turns it off,
//! and otherwise the terminal's own capabilities are used.

use std::env;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::phases::{BuildReport, BuildResult, Level};

/// Whether output is decorated with colours and emoji
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Decide from the `--color` value (`always`, `never` or `auto`) and
    /// the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = if color_flag.eq_ignore_ascii_case("always") {
            true
        } else if color_flag.eq_ignore_ascii_case("never") {
            false
        } else {
            env_preference()
                .unwrap_or_else(|| console::Term::stdout().features().colors_supported())
        };
        Self { use_color }
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn decorated() -> Self {
        Self { use_color: true }
    }

    /// A spinner for a long-running step.
    ///
    /// Hidden when output is not decorated, so logs and piped output stay
    /// clean.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if !self.use_color {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.blue} {msg}")
        {
            pb.set_style(spinner_style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The colour preference expressed through environment variables, if any
fn env_preference() -> Option<bool> {
    let set_to = |name: &str| env::var(name).ok();
    if env::var_os("NO_COLOR").is_some() || set_to("CLICOLOR").as_deref() == Some("0") {
        return Some(false);
    }
    if set_to("CLICOLOR_FORCE").is_some_and(|v| !v.is_empty() && v != "0") {
        return Some(true);
    }
    if set_to("TERM").as_deref() == Some("dumb") {
        return Some(false);
    }
    None
}

/// `decorated` when output is decorated, `plain` otherwise
pub fn emoji<'a>(config: &OutputConfig, decorated: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        decorated
    } else {
        plain
    }
}

/// Render the outcome of one application, followed by its warnings and
/// failure
pub fn format_result(config: &OutputConfig, result: &BuildResult) -> String {
    let (marker, status) = if result.success {
        (emoji(config, "✅", "[OK]"), "built")
    } else {
        (emoji(config, "❌", "[FAILED]"), "failed")
    };
    let id = if config.use_color {
        style(&result.app_id).bold().to_string()
    } else {
        result.app_id.clone()
    };

    let mut lines = vec![format!("{} {} {} ({})", marker, id, status, result.flavor)];
    if let Some(web_root) = &result.web_root {
        lines.push(format!("    web root: {}", web_root.display()));
    }
    for diagnostic in &result.diagnostics {
        let line = match diagnostic.level {
            Level::Info => continue,
            Level::Warning => format!("    warning: {}", diagnostic.message),
            Level::Error => format!("    error: {}", diagnostic.message),
        };
        lines.push(if config.use_color {
            let styled = match diagnostic.level {
                Level::Error => style(line).red(),
                _ => style(line).yellow(),
            };
            styled.to_string()
        } else {
            line
        });
    }
    lines.join("\n")
}

/// One-line summary of a run
pub fn format_summary(config: &OutputConfig, report: &BuildReport) -> String {
    let built = report.results.iter().filter(|r| r.success).count();
    let total = report.results.len();
    if report.success {
        format!(
            "{} Built {} application(s)",
            emoji(config, "🎉", "[DONE]"),
            total
        )
    } else {
        format!(
            "{} {} of {} application(s) failed",
            emoji(config, "💥", "[FAILED]"),
            total - built,
            total
        )
    }
}
