//! Ignore-file templates seeded into build directories

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Ignore rules for a standard Symfony application
pub const SYMFONY_GITIGNORE: &str = "\
/app/bootstrap.php.cache
/app/cache/*
/app/config/parameters.yml
/app/logs/*
/app/phpunit.xml
/bin/
/build/
/composer.phar
/var/*
/vendor/
/web/bundles/
";

/// Ignore rules for a Composer-managed Drupal site
pub const DRUPAL_GITIGNORE: &str = "\
/sites/*/files
/sites/*/private
/sites/*/settings.local.php
/vendor/
";

const GITIGNORE: &str = ".gitignore";

/// Merge the lines of `template` into `<dir>/.gitignore`.
///
/// Existing lines are kept in place and lines already present are not
/// repeated. Returns the number of lines added.
pub fn merge_gitignore(dir: &Path, template: &str) -> Result<usize> {
    let path = dir.join(GITIGNORE);
    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let present: Vec<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<&str> = template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !present.contains(line))
        .collect();
    if missing.is_empty() {
        return Ok(0);
    }

    let mut merged = existing;
    if !merged.is_empty() && !merged.ends_with('\n') {
        merged.push('\n');
    }
    for line in &missing {
        merged.push_str(line);
        merged.push('\n');
    }
    fs::write(&path, merged)?;
    Ok(missing.len())
}
