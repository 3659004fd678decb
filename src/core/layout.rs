//! Output directory layout for a compilation run.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs::ensure_dir;

/// The four coupled output directories of a compilation run.
///
/// All are derived from the target root; the generated-source
/// destination can be overridden per request (the descriptor
/// self-compile targets the fetched toolchain tree instead).
#[derive(Debug, Clone)]
pub struct TargetLayout {
    root: PathBuf,
    classes: PathBuf,
    proto: PathBuf,
    generated: PathBuf,
}

/// Default generated-source directory name under the target root.
pub const GENERATED_SRC_DIR: &str = "protosrc";

impl TargetLayout {
    /// Layout rooted at `target_root` with the default generated-source
    /// destination.
    pub fn new(target_root: &Path) -> Self {
        TargetLayout {
            root: target_root.to_path_buf(),
            classes: target_root.join("classes"),
            proto: target_root.join("proto"),
            generated: target_root.join(GENERATED_SRC_DIR),
        }
    }

    /// Override the generated-source destination.
    pub fn with_generated(mut self, generated: impl Into<PathBuf>) -> Self {
        self.generated = generated.into();
        self
    }

    /// Target root (`target/`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compiled-bindings destination for the downstream step
    /// (`target/classes`).
    pub fn classes(&self) -> &Path {
        &self.classes
    }

    /// Materialized-dependency destination (`target/proto`).
    pub fn proto(&self) -> &Path {
        &self.proto
    }

    /// Generated-source destination (`target/protosrc` by default).
    pub fn generated(&self) -> &Path {
        &self.generated
    }

    /// Create all four directories.
    pub fn ensure(&self) -> Result<()> {
        ensure_dir(&self.root)?;
        ensure_dir(&self.classes)?;
        ensure_dir(&self.proto)?;
        ensure_dir(&self.generated)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = TargetLayout::new(Path::new("target"));

        assert_eq!(layout.root(), Path::new("target"));
        assert_eq!(layout.classes(), Path::new("target/classes"));
        assert_eq!(layout.proto(), Path::new("target/proto"));
        assert_eq!(layout.generated(), Path::new("target/protosrc"));
    }

    #[test]
    fn test_generated_override() {
        let layout = TargetLayout::new(Path::new("target")).with_generated("/tmp/gen");

        assert_eq!(layout.generated(), Path::new("/tmp/gen"));
        assert_eq!(layout.proto(), Path::new("target/proto"));
    }

    #[test]
    fn test_ensure_creates_all() {
        let tmp = TempDir::new().unwrap();
        let layout = TargetLayout::new(&tmp.path().join("target"));

        layout.ensure().unwrap();

        assert!(layout.root().is_dir());
        assert!(layout.classes().is_dir());
        assert!(layout.proto().is_dir());
        assert!(layout.generated().is_dir());
    }
}
