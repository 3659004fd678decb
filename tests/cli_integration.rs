//! CLI integration tests for Protoforge.
//!
//! These tests run the real binary against a temp project whose
//! manifest points at a stub compiler, so no toolchain is ever
//! downloaded or built.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the protoforge binary command.
fn protoforge() -> Command {
    Command::cargo_bin("protoforge").unwrap()
}

/// Write an executable stub compiler that records its argv to
/// `<dir>/protoc-args.log`, then exits with `exit_code`.
fn write_stub_protoc(dir: &Path, exit_code: i32) -> std::path::PathBuf {
    let stub = dir.join("fake-protoc");
    let log = dir.join("protoc-args.log");
    fs::write(
        &stub,
        format!("#!/bin/sh\necho \"$@\" >> {}\nexit {}\n", log.display(), exit_code),
    )
    .unwrap();
    fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();
    stub
}

/// Create a temp project with a manifest, a stub compiler, and a proto
/// root containing `a.proto` (imports `b.proto`) and `b.proto`.
fn setup_project(exit_code: i32) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let stub = write_stub_protoc(tmp.path(), exit_code);

    fs::write(
        tmp.path().join("Protoforge.toml"),
        format!(
            r#"[project]
name = "integration-test"

[protobuf]
protoc = "{}"
proto_path = "proto"
cache_dir = "{}"
"#,
            stub.display(),
            tmp.path().join("cache").display()
        ),
    )
    .unwrap();

    let proto = tmp.path().join("proto");
    fs::create_dir_all(&proto).unwrap();
    fs::write(proto.join("a.proto"), "import \"b.proto\";\nmessage A {}\n").unwrap();
    fs::write(proto.join("b.proto"), "message B {}\n").unwrap();

    tmp
}

// ============================================================================
// protoforge compile
// ============================================================================

#[test]
fn test_compile_invokes_stub_for_each_file() {
    let tmp = setup_project(0);

    protoforge()
        .args(["compile"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let log = fs::read_to_string(tmp.path().join("protoc-args.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("a.proto "));
    assert!(lines[1].starts_with("b.proto "));

    // Include flags cover the dependency dir, the proto root, and the
    // toolchain include root.
    assert!(lines[0].contains("-I."));
    assert!(lines[0].contains("target/proto"));
    assert!(lines[0].contains("protobuf-2.6.1/src"));
}

#[test]
fn test_compile_explicit_file_list() {
    let tmp = setup_project(0);

    protoforge()
        .args(["compile", "a.proto"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let log = fs::read_to_string(tmp.path().join("protoc-args.log")).unwrap();
    assert_eq!(log.lines().count(), 1);

    // b.proto is present locally: imported, but never materialized.
    assert!(!tmp.path().join("target/proto/b.proto").exists());
}

#[test]
fn test_compile_failure_aborts_batch() {
    let tmp = setup_project(1);

    protoforge()
        .args(["compile"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed for a.proto"));

    // The second file was never attempted.
    let log = fs::read_to_string(tmp.path().join("protoc-args.log")).unwrap();
    assert_eq!(log.lines().count(), 1);
}

#[test]
fn test_compile_without_manifest_or_protos_is_noop() {
    let tmp = TempDir::new().unwrap();

    protoforge()
        .args(["compile"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(!tmp.path().join("target").exists());
}

// ============================================================================
// protoforge clean
// ============================================================================

#[test]
fn test_clean_removes_generated_dirs() {
    let tmp = setup_project(0);

    protoforge()
        .args(["compile"])
        .current_dir(tmp.path())
        .assert()
        .success();
    assert!(tmp.path().join("target/protosrc").exists());

    protoforge()
        .args(["clean"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(!tmp.path().join("target/protosrc").exists());
    assert!(!tmp.path().join("target/proto").exists());
    assert!(!tmp.path().join("target/classes").exists());
}

// ============================================================================
// protoforge completions
// ============================================================================

#[test]
fn test_completions_bash() {
    protoforge()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("protoforge"));
}
