use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn packbuilder() -> Command {
    Command::cargo_bin("packbuilder").unwrap()
}

#[test]
fn test_missing_config_argument() {
    packbuilder()
        .assert()
        .failure()
        .stderr(predicate::str::contains("<CONFIG>"));
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();

    packbuilder()
        .arg(temp_dir.path().join("absent.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_malformed_document() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("packs.yml");
    fs::write(&config, "buildpacks: [name: ruby\n").unwrap();

    packbuilder()
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pack document"));
}

#[test]
fn test_all_skipped_packs_succeed_without_side_effects() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("packs.yml");
    fs::write(
        &config,
        "buildpacks:\n\
         \x20 - name: ruby\n\
         \x20   version: 1.2.3\n\
         \x20   stack: cflinuxfs4\n\
         \x20   official: true\n\
         \x20   type: tar\n\
         \x20   skip: true\n\
         \x20 - name: java\n\
         \x20   version: 4.5\n\
         \x20   type: git\n\
         \x20   build:\n\
         \x20     type: java\n\
         \x20   skip: true\n",
    )
    .unwrap();
    let report = temp_dir.path().join("report.yml");

    packbuilder()
        .arg("--work-dir")
        .arg(temp_dir.path())
        .arg("--report")
        .arg(&report)
        .arg("--strict")
        .arg(&config)
        .assert()
        .success();

    assert!(!temp_dir.path().join("ruby").exists());
    assert!(!temp_dir.path().join("java").exists());
    assert!(!temp_dir.path().join("out").exists());
    let written = fs::read_to_string(&report).unwrap();
    assert_eq!(written.matches("status: skipped").count(), 2);
}

#[test]
fn test_strict_run_reports_failed_pack() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("packs.yml");
    fs::write(
        &config,
        "buildpacks:\n  - name: staticfile\n    version: 1.6.0\n    type: svn\n",
    )
    .unwrap();

    packbuilder()
        .arg("--work-dir")
        .arg(temp_dir.path())
        .arg("--strict")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 buildpack(s) failed"));
}
