//! CLI integration tests
//!
//! These tests drive the built binary and check:
//! - Command parsing and help output
//! - Artifact files and `--print` output
//! - Error handling and exit codes

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the jbs-planner binary
fn planner_bin() -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .to_path_buf();

    // Integration tests run from target/<profile>/deps
    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join("jbs-planner")
}

const REQUEST: &str = r#"recipe:
  tool: gradle
  image: quay.io/redhat-appstudio/hacbs-jdk11-builder:latest
  javaVersion: "11"
  toolVersion: "7.6"
  toolVersions:
    gradle: "7.6"
tenant:
  namespace: team-a
build:
  name: 5f2b0c
  scm:
    scmURL: https://github.com/example/lib.git
    tag: v2.0.0
    commitHash: cafebabe
  version: 2.0.0
processorImage: quay.io/redhat-appstudio/hacbs-jvm-build-request-processor:1.0
buildId: build-xyz
params:
  - name: URL
    value: https://github.com/example/lib.git
  - name: HASH
    value: cafebabe
  - name: GOALS
    value: [build, publishToMavenLocal]
commitTime: 1700000000
"#;

fn write_request(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("request.yaml");
    fs::write(&path, REQUEST).expect("Failed to write request");
    path
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(planner_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("JBS_PLANNER_LOG_LEVEL")
        .output()
        .expect("Failed to execute jbs-planner")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("non UTF-8 temp path")
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("jbs-planner"));
    assert!(stdout.contains("plan"));
    assert!(stdout.contains("deploy"));
    assert!(stdout.contains("build-id"));
}

#[test]
fn test_cli_version() {
    let output = run(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_plan_writes_all_artifacts() {
    let dir = TempDir::new().unwrap();
    let request = write_request(&dir);
    let out = dir.path().join("out");

    let output = run(&["plan", path_arg(&request), "--output-dir", path_arg(&out)]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    for name in [
        "pipeline.yaml",
        "Dockerfile.diagnostic",
        "Containerfile",
        "run-build.sh",
    ] {
        assert!(out.join(name).is_file(), "missing {}", name);
    }

    let pipeline: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(out.join("pipeline.yaml")).unwrap()).unwrap();
    let tasks = pipeline["tasks"].as_sequence().unwrap();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0]["name"].as_str(), Some("pre-build"));

    let script = fs::read_to_string(out.join("run-build.sh")).unwrap();
    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(script.contains("set -- \"$@\" build publishToMavenLocal "));
}

#[test]
fn test_plan_json_format() {
    let dir = TempDir::new().unwrap();
    let request = write_request(&dir);

    let output = run(&[
        "plan",
        path_arg(&request),
        "--output-dir",
        path_arg(dir.path()),
        "--format",
        "json",
    ]);

    assert!(output.status.success());
    let json = fs::read_to_string(dir.path().join("pipeline.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["params"].is_array());
}

#[test]
fn test_plan_print_containerfile() {
    let dir = TempDir::new().unwrap();
    let request = write_request(&dir);

    let output = run(&["plan", path_arg(&request), "--print", "containerfile"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("FROM quay.io/redhat-appstudio/hacbs-jdk11-builder:latest\n"));
    assert!(stdout.contains("RUN /var/workdir/run-build.sh"));
    assert!(!dir.path().join("Containerfile").exists());
}

#[test]
fn test_plan_missing_request_fails() {
    let output = run(&["plan", "/nonexistent/request.yaml"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/nonexistent/request.yaml"));
}

#[test]
fn test_plan_invalid_quantity_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("request.yaml");
    let request = REQUEST.replace(
        "tenant:\n  namespace: team-a\n",
        "tenant:\n  namespace: team-a\n  buildSettings:\n    taskRequestMemory: huge\n",
    );
    fs::write(&path, request).unwrap();

    let output = run(&["plan", path_arg(&path), "--print", "pipeline"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("taskRequestMemory"));
}

#[test]
fn test_deploy_prints_tag_pipeline() {
    let dir = TempDir::new().unwrap();
    let tenant = dir.path().join("tenant.yaml");
    fs::write(
        &tenant,
        "namespace: team-a\nmavenDeployment:\n  repository: https://repo.example.com/releases\n",
    )
    .unwrap();

    let output = run(&[
        "deploy",
        path_arg(&tenant),
        "--processor-image",
        "quay.io/jbs/processor:1.0",
        "--gavs",
        "org.acme:a:1.0,org.acme:b:1.0",
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let pipeline: serde_yaml::Value = serde_yaml::from_str(&stdout).unwrap();
    assert_eq!(pipeline["tasks"][0]["name"].as_str(), Some("tag"));
    assert!(stdout.contains("GAVS=org.acme:a:1.0,org.acme:b:1.0"));
    assert!(stdout.contains("--mvn-repo=https://repo.example.com/releases"));
}

#[test]
fn test_build_id_is_stable() {
    let first = run(&["build-id", "https://github.com/example/lib.git", "v1.0"]);
    let second = run(&["build-id", "https://github.com/example/lib.git", "v1.0"]);
    let other = run(&["build-id", "https://github.com/example/lib.git", "v1.0", "sub"]);

    assert!(first.status.success());
    let id = String::from_utf8_lossy(&first.stdout).trim().to_string();
    assert_eq!(id.len(), 32);
    assert_eq!(first.stdout, second.stdout);
    assert_ne!(first.stdout, other.stdout);
}

#[test]
fn test_invalid_subcommand() {
    let output = run(&["detect"]);
    assert!(!output.status.success());
}
