//! Transitive import resolution for interface-definition files.
//!
//! Import references are discovered syntactically (lines beginning with
//! the `import` keyword); the grammar itself is the compiler's concern.
//! Missing dependencies are materialized into the destination directory
//! from the bundled resource set. A path already on disk under the
//! proto root or the destination terminates recursion for that branch,
//! which is also what makes import cycles terminate.

pub mod resources;

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;

use crate::util::fs as fsutil;

pub use resources::{EmbeddedResources, ResourceSet};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*import\s+(?:public\s+|weak\s+)?"([^"]+)""#).unwrap()
});

/// Typed error for the strict-imports mode.
#[derive(Debug, Error)]
pub enum DepsError {
    #[error(
        "unresolved import `{path}`: not found under the proto root, \
         the dependency directory, or the bundled resources"
    )]
    UnresolvedImport { path: String },
}

/// Import references appearing in `contents`, in line order.
pub fn parse_imports(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| IMPORT_RE.captures(line).map(|c| c[1].to_string()))
        .collect()
}

/// Imports of the file at `path`; empty when the file does not exist.
fn imports_of(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_imports(&contents))
}

/// Materialize the transitive import closure of `roots` into `dest`.
///
/// `roots` are paths relative to `proto_root`. Imports already present
/// under `proto_root` or `dest` are left untouched and not recursed
/// into. Imports found in `resources` are copied into `dest` and their
/// own imports enqueued. Imports found nowhere are skipped silently,
/// or are fatal when `strict` is set.
pub fn materialize_imports(
    proto_root: &Path,
    roots: &[PathBuf],
    dest: &Path,
    resources: &dyn ResourceSet,
    strict: bool,
) -> Result<()> {
    let mut queue: VecDeque<String> = VecDeque::new();
    for root in roots {
        queue.extend(imports_of(&proto_root.join(root))?);
    }

    while let Some(rel) = queue.pop_front() {
        if proto_root.join(&rel).exists() || dest.join(&rel).exists() {
            continue;
        }

        match resources.read(&rel) {
            Some(contents) => {
                fsutil::write_bytes(&dest.join(&rel), &contents)?;
                tracing::debug!("materialized bundled dependency {rel}");
                queue.extend(parse_imports(&String::from_utf8_lossy(&contents)));
            }
            None if strict => {
                return Err(DepsError::UnresolvedImport { path: rel }.into());
            }
            None => {
                tracing::debug!("skipping unresolved import {rel}");
            }
        }
    }

    Ok(())
}
