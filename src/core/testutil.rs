//! Fixtures shared by the pipeline tests: stand-in tools and source archives

use crate::config::Config;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Config rooted at `work_dir` with the default tool names
pub fn test_config(work_dir: &Path) -> Config {
    let mut config = Config {
        work_dir: work_dir.to_path_buf(),
        ..Config::default()
    };
    config.artifacts.output_dir = work_dir.join("out");
    config
}

/// Write an executable shell script
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A tool that appends `<cwd>|<args>|<BUNDLE_GEMFILE>` to `<name>.log` and succeeds
pub fn recording_tool(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    let log = dir.join(format!("{name}.log"));
    let script = write_script(
        dir,
        name,
        &format!(
            "echo \"$(pwd)|$*|${{BUNDLE_GEMFILE:-}}\" >> '{}'",
            log.display()
        ),
    );
    (script, log)
}

/// Lines written by a `recording_tool`, empty when it never ran
pub fn recorded_calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// A git stand-in: `clone` creates its destination directory, everything is logged
pub fn fake_git(dir: &Path) -> (PathBuf, PathBuf) {
    let log = dir.join("git.log");
    let script = write_script(
        dir,
        "git",
        &format!(
            "echo \"$(pwd)|$*\" >> '{}'\n\
             if [ \"$1\" = clone ]; then\n\
             \x20 for last; do :; done\n\
             \x20 mkdir -p \"$last\" && echo cloned > \"$last/manifest.yml\"\n\
             fi",
            log.display()
        ),
    );
    (script, log)
}

/// gzip'd tarball containing `top/` with the given files
pub fn source_archive(dir: &Path, top: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let staging = dir.join("staging");
    let root = staging.join(top);
    fs::create_dir_all(&root).unwrap();
    for (name, content) in files {
        fs::write(root.join(name), content).unwrap();
    }

    let archive = dir.join(format!("{top}.tar.gz"));
    let status = Command::new("tar")
        .arg("-czf")
        .arg(&archive)
        .arg("-C")
        .arg(&staging)
        .arg(top)
        .status()
        .unwrap();
    assert!(status.success());

    let bytes = fs::read(&archive).unwrap();
    fs::remove_dir_all(&staging).unwrap();
    fs::remove_file(&archive).unwrap();
    bytes
}
