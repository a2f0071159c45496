//! End-to-end tests for the `local-build clean` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

fn built_fixture() -> TestFixture {
    let fixture = TestFixture::new()
        .with_app("", descriptors::STATIC)
        .with_file("site/index.html", "docs");
    fixture.command().arg("build").assert().success();
    fixture
}

#[test]
fn test_clean_removes_build_output() {
    let fixture = built_fixture();
    fixture
        .child(".platform/local/builds/docs")
        .assert(predicate::path::exists());

    fixture
        .command()
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    fixture
        .child(".platform/local/builds/docs")
        .assert(predicate::path::missing());
    fixture.child("site/index.html").assert(predicate::path::exists());
}

#[test]
fn test_clean_all_removes_web_root() {
    let fixture = built_fixture();

    fixture.command().args(["clean", "--all"]).assert().success();

    fixture.child("_www").assert(predicate::path::missing());
}

#[test]
fn test_clean_nothing() {
    let fixture = TestFixture::new().with_file("index.html", "hi");

    fixture
        .command()
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
}
