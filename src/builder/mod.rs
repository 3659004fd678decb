//! Compilation driver: include-path construction, compiler invocation,
//! and hand-off of generated sources.

pub mod bootstrap;
pub mod downstream;
pub mod stale;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::TargetLayout;
use crate::deps::{self, ResourceSet};
use crate::util::fs as fsutil;
use crate::util::shell::{Shell, Status};
use crate::util::{ProcessBuilder, ProcessRunner};

pub use downstream::{Downstream, JavaBuildModel, GENERATED_SOURCE_OPTIONS};
pub use stale::{HashStaleness, MtimeStaleness, Staleness};

/// One compilation request.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Files to compile, relative to the proto root.
    pub files: Vec<PathBuf>,

    /// Generated-source destination; the layout default when `None`.
    pub generated_dir: Option<PathBuf>,

    /// Whether downstream build hooks run after generation. The
    /// descriptor self-compile turns this off so the host build tool's
    /// own triggers cannot re-enter the pipeline while it is running.
    pub downstream: bool,
}

impl CompileRequest {
    pub fn new(files: Vec<PathBuf>) -> Self {
        CompileRequest {
            files,
            generated_dir: None,
            downstream: true,
        }
    }

    pub fn with_generated_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.generated_dir = Some(dir.into());
        self
    }

    pub fn without_downstream(mut self) -> Self {
        self.downstream = false;
        self
    }
}

/// What a compilation run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Outputs were newer than every input; nothing ran.
    Fresh,
    /// The batch was compiled.
    Compiled { files: usize },
}

/// Drives the external compiler over a batch of files.
pub struct CompileDriver<'a> {
    /// Compiler executable.
    pub protoc: PathBuf,
    /// Primary search root for interface definitions.
    pub proto_root: PathBuf,
    /// Base of the output tree.
    pub target_root: PathBuf,
    /// The toolchain's own include root (bundled schema sources).
    pub include_root: PathBuf,
    /// Fail on imports resolvable nowhere.
    pub strict_imports: bool,

    pub runner: &'a dyn ProcessRunner,
    pub resources: &'a dyn ResourceSet,
    pub staleness: &'a dyn Staleness,
    pub shell: &'a Shell,
}

impl CompileDriver<'_> {
    /// Compile the requested batch.
    ///
    /// When neither the generated-source tree nor the compiled-output
    /// tree is stale relative to the proto root, this is a complete
    /// no-op: no dependency materialization, no compiler invocation,
    /// no downstream hand-off. The first failing file aborts the whole
    /// batch.
    pub fn compile(
        &self,
        req: &CompileRequest,
        downstream: &mut dyn Downstream,
    ) -> Result<CompileOutcome> {
        let mut layout = TargetLayout::new(&self.target_root);
        if let Some(dir) = &req.generated_dir {
            layout = layout.with_generated(dir);
        }

        // Either output may be missing or stale independently, e.g.
        // after a partial clean.
        let stale = self
            .staleness
            .is_stale(&self.proto_root, layout.generated())?
            || self.staleness.is_stale(&self.proto_root, layout.classes())?;
        if !stale {
            self.shell
                .status(Status::Skipped, "interface definitions are up to date");
            return Ok(CompileOutcome::Fresh);
        }

        layout.ensure()?;
        deps::materialize_imports(
            &self.proto_root,
            &req.files,
            layout.proto(),
            self.resources,
            self.strict_imports,
        )?;

        for file in &req.files {
            self.shell.status(Status::Compiling, file.display());
            self.run_protoc(file, layout.generated(), layout.proto())?;
        }

        self.staleness
            .mark_fresh(&self.proto_root, layout.generated())?;
        self.staleness
            .mark_fresh(&self.proto_root, layout.classes())?;

        if req.downstream {
            let options: Vec<String> = GENERATED_SOURCE_OPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect();
            downstream.accept_generated(layout.generated(), &options)?;
        }

        Ok(CompileOutcome::Compiled {
            files: req.files.len(),
        })
    }

    fn run_protoc(&self, file: &Path, generated: &Path, proto_dest: &Path) -> Result<()> {
        let cmd = ProcessBuilder::new(&self.protoc)
            .arg(file)
            .arg(format!(
                "--java_out={}",
                fsutil::normalize_path(generated).display()
            ))
            .arg("-I.")
            .arg(format!("-I{}", fsutil::normalize_path(proto_dest).display()))
            .arg(format!(
                "-I{}",
                fsutil::normalize_path(&self.proto_root).display()
            ))
            .arg(format!(
                "-I{}",
                fsutil::normalize_path(&self.include_root).display()
            ))
            .cwd(&self.proto_root);
        tracing::debug!("running `{}`", cmd.display_command());

        let output = self.runner.run(&cmd)?;
        if !output.success() {
            bail!(
                "`{}` failed for {} (exit {:?}):\n{}",
                cmd.display_command(),
                file.display(),
                output.code,
                output.stderr
            );
        }
        Ok(())
    }
}
