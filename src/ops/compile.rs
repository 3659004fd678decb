//! Implementation of `protoforge compile` and `protoforge fetch`.
//!
//! The entry task resolves the file list (explicit or discovered),
//! ensures the compiler exists, runs the descriptor self-compile when
//! the project is the toolchain core library itself, then drives the
//! compiler over the batch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::builder::{
    bootstrap, stale, CompileDriver, CompileOutcome, CompileRequest, JavaBuildModel,
};
use crate::core::{Manifest, ProtobufConfig};
use crate::deps::EmbeddedResources;
use crate::toolchain::{CacheStore, Provisioner};
use crate::util::shell::{Shell, Status};
use crate::util::SystemRunner;

/// Interface-definition file extension.
pub const PROTO_EXTENSION: &str = "proto";

/// Options for the compile command.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Explicit files relative to the proto root (empty = discover).
    pub files: Vec<PathBuf>,

    /// Fail on imports that cannot be resolved anywhere.
    pub strict_imports: bool,
}

/// Run the compile task for the project rooted at `project_root`.
///
/// Returns the build model handed to the downstream Java compile.
pub fn run_compile(
    manifest: &Manifest,
    project_root: &Path,
    shell: &Shell,
    opts: &CompileOptions,
) -> Result<JavaBuildModel> {
    let config = &manifest.protobuf;
    let proto_root = config.proto_root(project_root);
    let target_root = config.target_root(project_root);

    let files = if opts.files.is_empty() {
        discover_proto_files(&proto_root)?
    } else {
        opts.files.clone()
    };

    let mut model = JavaBuildModel::default();
    if files.is_empty() && !manifest.is_bootstrap() {
        shell.status(
            Status::Skipped,
            format!("no interface definitions under {}", proto_root.display()),
        );
        return Ok(model);
    }

    let store = cache_store(config);
    let runner = SystemRunner;
    let provisioner = Provisioner::new(&store, &runner, shell);
    let protoc = provisioner.ensure_compiler(config)?;

    let resources = EmbeddedResources;
    let staleness = stale::for_mode(config.staleness);
    let driver = CompileDriver {
        protoc,
        proto_root: proto_root.clone(),
        target_root,
        include_root: store.include_dir(&config.version),
        strict_imports: opts.strict_imports || config.strict_imports,
        runner: &runner,
        resources: &resources,
        staleness: staleness.as_ref(),
        shell,
    };

    if manifest.is_bootstrap() {
        bootstrap::bootstrap_descriptor(&provisioner, config, &proto_root, &driver, &mut model)?;
    }

    match driver.compile(&CompileRequest::new(files), &mut model)? {
        CompileOutcome::Fresh => {}
        CompileOutcome::Compiled { files } => {
            shell.status(
                Status::Finished,
                format!(
                    "{files} interface definition{} compiled",
                    if files == 1 { "" } else { "s" }
                ),
            );
        }
    }

    Ok(model)
}

/// Provision the toolchain without compiling anything.
pub fn run_fetch(manifest: &Manifest, shell: &Shell) -> Result<PathBuf> {
    let config = &manifest.protobuf;
    let store = cache_store(config);
    let runner = SystemRunner;
    let provisioner = Provisioner::new(&store, &runner, shell);

    let protoc = provisioner.ensure_compiler(config)?;
    shell.status(Status::Finished, format!("compiler at {}", protoc.display()));
    Ok(protoc)
}

fn cache_store(config: &ProtobufConfig) -> CacheStore {
    let root = config
        .cache_dir
        .clone()
        .unwrap_or_else(CacheStore::default_root);
    CacheStore::new(root)
}

/// All interface-definition files under `proto_root`, relative to it,
/// sorted. Matching: the file name ends in `.proto` and does not start
/// with a hidden-file marker.
pub fn discover_proto_files(proto_root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !proto_root.is_dir() {
        return Ok(files);
    }

    for entry in WalkDir::new(proto_root) {
        let entry = entry.with_context(|| format!("failed to scan {}", proto_root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || !name.ends_with(&format!(".{PROTO_EXTENSION}")) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(proto_root)
            .expect("walked entries live under the root");
        files.push(relative.to_path_buf());
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_proto_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("api/v1")).unwrap();
        fs::write(root.join("a.proto"), "").unwrap();
        fs::write(root.join("api/v1/b.proto"), "").unwrap();
        fs::write(root.join("api/v1/.hidden.proto"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let files = discover_proto_files(root).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("a.proto"), PathBuf::from("api/v1/b.proto")]
        );
    }

    #[test]
    fn test_discover_missing_root() {
        let tmp = TempDir::new().unwrap();
        let files = discover_proto_files(&tmp.path().join("nope")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_run_compile_with_stubbed_compiler() {
        let tmp = TempDir::new().unwrap();
        let project_root = tmp.path();
        let proto_root = project_root.join("resources/proto");
        fs::create_dir_all(&proto_root).unwrap();
        fs::write(proto_root.join("a.proto"), "message A {}\n").unwrap();

        // Stub executable that always exits 0.
        let stub = project_root.join("fake-protoc");
        fs::write(&stub, "#!/bin/sh\nexit 0\n").unwrap();
        crate::util::fs::make_executable(&stub).unwrap();

        let mut manifest = Manifest::default();
        manifest.protobuf.protoc = Some(stub);
        manifest.protobuf.cache_dir = Some(project_root.join("cache"));

        let shell = Shell::default();
        let model = run_compile(&manifest, project_root, &shell, &CompileOptions::default())
            .unwrap();

        assert_eq!(
            model.source_roots,
            vec![project_root.join("target/protosrc")]
        );
        assert_eq!(model.compiler_options, vec!["-nowarn".to_string()]);
    }

    #[test]
    fn test_run_compile_empty_proto_root_is_noop() {
        let tmp = TempDir::new().unwrap();
        let manifest = Manifest::default();

        let shell = Shell::default();
        let model = run_compile(&manifest, tmp.path(), &shell, &CompileOptions::default())
            .unwrap();

        assert!(model.source_roots.is_empty());
        // No target tree was created.
        assert!(!tmp.path().join("target").exists());
    }
}
