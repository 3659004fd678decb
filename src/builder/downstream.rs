//! Boundary to the downstream language-compile step.
//!
//! After a successful compiler run, the generated-source directory is
//! handed to whatever compiles it into bytecode. That step belongs to
//! the host build tool; here it is only a trait the driver calls into.

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Compiler options applied to generated sources downstream: generated
/// code is not ours to lint.
pub const GENERATED_SOURCE_OPTIONS: &[&str] = &["-nowarn"];

/// Receives generated sources once a compilation batch succeeds.
pub trait Downstream {
    /// Add `source_root` to the downstream compile's source path and
    /// apply `options` to its compiler invocation.
    fn accept_generated(&mut self, source_root: &Path, options: &[String]) -> Result<()>;
}

/// What the host build tool's Java compile consumes: extra source
/// roots and compiler options, accumulated across driver runs.
#[derive(Debug, Default)]
pub struct JavaBuildModel {
    pub source_roots: Vec<PathBuf>,
    pub compiler_options: Vec<String>,
}

impl Downstream for JavaBuildModel {
    fn accept_generated(&mut self, source_root: &Path, options: &[String]) -> Result<()> {
        if !self.source_roots.iter().any(|r| r == source_root) {
            tracing::info!("extending java source path with {}", source_root.display());
            self.source_roots.push(source_root.to_path_buf());
        }
        for option in options {
            if !self.compiler_options.iter().any(|o| o == option) {
                self.compiler_options.push(option.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dedups_roots_and_options() {
        let mut model = JavaBuildModel::default();
        let options = vec!["-nowarn".to_string()];

        model
            .accept_generated(Path::new("target/protosrc"), &options)
            .unwrap();
        model
            .accept_generated(Path::new("target/protosrc"), &options)
            .unwrap();

        assert_eq!(model.source_roots, vec![PathBuf::from("target/protosrc")]);
        assert_eq!(model.compiler_options, vec!["-nowarn".to_string()]);
    }
}
