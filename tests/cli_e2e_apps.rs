//! End-to-end tests for the `local-build apps` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

#[test]
fn test_apps_lists_applications() {
    let fixture = TestFixture::new().with_api_and_web();

    fixture
        .command()
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("api\tphp:7.0\tsymfony\tapi"))
        .stdout(predicate::str::contains("web\tnodejs:10\tnodejs\tweb"));
}

#[test]
fn test_apps_tree() {
    let fixture = TestFixture::new()
        .with_app("", "name: site\ntype: php:7.4\n")
        .with_app("admin", "name: admin\ntype: nodejs:10\n");

    fixture
        .command()
        .args(["apps", "--tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("site php:7.4 composer ."))
        .stdout(predicate::str::contains("admin nodejs:10 nodejs admin"));
}

#[test]
fn test_apps_without_descriptors() {
    let fixture = TestFixture::new().with_file("index.html", "hi");

    fixture
        .command()
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("No applications found"));
}

#[test]
fn test_apps_with_project_option() {
    let fixture = TestFixture::new().with_api_and_web();

    let mut cmd = cargo_bin_cmd!("local-build");
    cmd.env("XDG_CONFIG_HOME", fixture.path().join(".config"))
        .env_remove("LOCAL_BUILD_CONFIG")
        .arg("-C")
        .arg(fixture.path())
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("api"));
}

#[test]
fn test_apps_malformed_descriptor() {
    let fixture = TestFixture::new().with_app("broken", descriptors::INVALID_YAML);

    fixture
        .command()
        .arg("apps")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse application descriptor"))
        .stderr(predicate::str::contains("broken"));
}

#[test]
fn test_apps_missing_config_file() {
    let fixture = TestFixture::new().with_api_and_web();

    fixture
        .command()
        .args(["--config", "missing.yaml", "apps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_apps_respects_user_config() {
    let fixture = TestFixture::new()
        .with_api_and_web()
        .with_file("custom.yaml", "ignored_dirs: [\".git\", \"web\"]\n");

    fixture
        .command()
        .args(["--config", "custom.yaml", "apps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api"))
        .stdout(predicate::str::contains("nodejs").not());
}
