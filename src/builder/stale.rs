//! Staleness evaluation for incremental builds.
//!
//! The default strategy compares aggregate modification times, matching
//! the behavior users expect from make-style tools: outputs older than
//! the newest input are regenerated. Timestamp comparison is vulnerable
//! to clock skew and timestamp-preserving copies, so a content-hash
//! strategy can be substituted behind the same trait.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::core::StalenessMode;
use crate::util::fs as fsutil;

/// Decides whether outputs must be regenerated from inputs.
pub trait Staleness {
    /// Whether `output` must be regenerated from `input`.
    fn is_stale(&self, input: &Path, output: &Path) -> Result<bool>;

    /// Record that `output` is up to date with respect to `input`.
    fn mark_fresh(&self, _input: &Path, _output: &Path) -> Result<()> {
        Ok(())
    }
}

/// Construct the staleness strategy for a configured mode.
pub fn for_mode(mode: StalenessMode) -> Box<dyn Staleness> {
    match mode {
        StalenessMode::Mtime => Box::new(MtimeStaleness),
        StalenessMode::Hash => Box::new(HashStaleness),
    }
}

/// Timestamp-based staleness.
///
/// The aggregate timestamp of a directory is the newest modification
/// time over every file in its recursive listing (the root entry itself
/// excluded); a single file contributes its own mtime; an empty or
/// missing path aggregates to the epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct MtimeStaleness;

/// Aggregate modification time of a path.
pub fn aggregate_mtime(path: &Path) -> SystemTime {
    if path.is_file() {
        return fsutil::mtime(path).unwrap_or(UNIX_EPOCH);
    }

    let mut newest = UNIX_EPOCH;
    if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                if let Ok(modified) = meta.modified() {
                    if modified > newest {
                        newest = modified;
                    }
                }
            }
        }
    }
    newest
}

impl Staleness for MtimeStaleness {
    fn is_stale(&self, input: &Path, output: &Path) -> Result<bool> {
        Ok(aggregate_mtime(input) > aggregate_mtime(output))
    }
}

/// Content-hash staleness.
///
/// A digest over the input tree is compared against a stamp file
/// written into the output directory by `mark_fresh`. Same public
/// contract as [`MtimeStaleness`]; immune to clock skew.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashStaleness;

const STAMP_FILE: &str = ".protoforge-stamp.json";

#[derive(Debug, Serialize, Deserialize)]
struct Stamp {
    digest: String,
}

fn tree_digest(path: &Path) -> Result<String> {
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();

    let mut hasher = Sha256::new();
    for file in &files {
        let rel = file.strip_prefix(path).unwrap_or(file);
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update([0]);
        let contents = fs::read(file)
            .with_context(|| format!("failed to read {} for hashing", file.display()))?;
        hasher.update(&contents);
    }
    Ok(hex::encode(hasher.finalize()))
}

impl Staleness for HashStaleness {
    fn is_stale(&self, input: &Path, output: &Path) -> Result<bool> {
        let stamp_path = output.join(STAMP_FILE);
        if !stamp_path.exists() {
            return Ok(true);
        }

        let contents = fs::read_to_string(&stamp_path)
            .with_context(|| format!("failed to read {}", stamp_path.display()))?;
        let stamp: Stamp = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", stamp_path.display()))?;

        Ok(stamp.digest != tree_digest(input)?)
    }

    fn mark_fresh(&self, input: &Path, output: &Path) -> Result<()> {
        fsutil::ensure_dir(output)?;
        let stamp = Stamp {
            digest: tree_digest(input)?,
        };
        let contents = serde_json::to_string_pretty(&stamp)?;
        fs::write(output.join(STAMP_FILE), contents)
            .with_context(|| format!("failed to write stamp in {}", output.display()))?;
        Ok(())
    }
}
