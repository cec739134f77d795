//! Binary-level tests: argument handling, exit codes and output.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Catalog with one chained kit and a single module.
fn catalog() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "kits/profiles.yaml",
        "profiles:\n  - base\n  - \"dev: inherits base\"\n  - \"prod: inherits dev\"\n",
    );
    write(
        root,
        "kits/prod/kit.yaml",
        "name: prod\nversion: 1.0.0\ndescription: Production kit\nmodules:\n  - name: svc\n    variant: fastapi\n",
    );
    write(
        root,
        "modules/svc/module.yaml",
        r#"name: svc
version: 0.1.0
generation:
  vendor:
    files:
      - template: x.tmpl
        relative: vendor/x.py
  variants:
    fastapi:
      files:
        - template: y.tmpl
          output: app/y.py
"#,
    );
    write(root, "modules/svc/templates/x.tmpl", "# {{ vendor_module }} for {{ project_name }}\n");
    write(root, "modules/svc/templates/y.tmpl", "# {{ variant }}\n");
    dir
}

/// The binary, isolated from the developer's config and environment.
fn rapidkit(work: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rapidkit").unwrap();
    cmd.current_dir(work)
        .env("HOME", work)
        .env("XDG_CONFIG_HOME", work.join(".config"))
        .env_remove("RAPIDKIT_CATALOG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn version_matches_package() {
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn bad_arguments_exit_with_two() {
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .args(["create", "svc", "--var", "novalue"])
        .assert()
        .code(2);
}

#[test]
fn list_prints_kits_as_json() {
    let cat = catalog();
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .arg("--catalog")
        .arg(cat.path())
        .args(["list", "--modules", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"prod\""))
        .stdout(predicate::str::contains("\"svc\""));
}

#[test]
fn info_shows_profile_chain() {
    let cat = catalog();
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .arg("--catalog")
        .arg(cat.path())
        .args(["info", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base -> dev -> prod"))
        .stdout(predicate::str::contains("svc"));
}

#[test]
fn missing_catalog_is_a_configuration_error() {
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .args(["list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Catalog not found"));
}

#[test]
fn create_writes_project() {
    let cat = catalog();
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .arg("--catalog")
        .arg(cat.path())
        .args(["create", "svc", "--kit", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project 'svc' created (2 files)"));

    let out = work.path().join("svc");
    assert_eq!(
        fs::read_to_string(out.join("vendor/x.py")).unwrap(),
        "# svc@0.1.0 for svc\n"
    );
    assert_eq!(fs::read_to_string(out.join("app/y.py")).unwrap(), "# fastapi\n");
}

#[test]
fn dry_run_writes_nothing() {
    let cat = catalog();
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .arg("--catalog")
        .arg(cat.path())
        .args(["create", "svc", "--kit", "prod", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: 2 files"))
        .stdout(predicate::str::contains("app/y.py"));

    assert!(!work.path().join("svc").exists());
}

#[test]
fn unknown_kit_exits_with_three() {
    let cat = catalog();
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .arg("--catalog")
        .arg(cat.path())
        .args(["create", "svc", "--kit", "nope"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Kit not found: nope"));
}

#[test]
fn non_empty_output_needs_force() {
    let cat = catalog();
    let work = tempfile::tempdir().unwrap();
    write(work.path(), "svc/keep.txt", "mine");

    rapidkit(work.path())
        .arg("--catalog")
        .arg(cat.path())
        .args(["create", "svc", "--kit", "prod"])
        .assert()
        .code(2);
    assert!(work.path().join("svc/keep.txt").exists());

    rapidkit(work.path())
        .arg("--catalog")
        .arg(cat.path())
        .args(["create", "svc", "--kit", "prod", "--force"])
        .assert()
        .success();
    assert!(!work.path().join("svc/keep.txt").exists());
    assert!(work.path().join("svc/app/y.py").exists());
}

#[test]
fn completions_are_generated() {
    let work = tempfile::tempdir().unwrap();
    rapidkit(work.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rapidkit"));
}

#[test]
fn no_color_accepts_conventional_values() {
    let work = tempfile::tempdir().unwrap();
    for value in ["1", "true", "yes", "0", ""] {
        rapidkit(work.path())
            .env("NO_COLOR", value)
            .args(["completions", "bash"])
            .assert()
            .success();
    }
}
