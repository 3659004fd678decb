//! Version-keyed toolchain cache.
//!
//! The cache holds one entry per toolchain release: the downloaded
//! archive and the unpacked source tree containing the built compiler.
//! Entry paths are pure functions of the version string and the cache
//! root; they are only ever checked for existence, never rewritten.
//! The cache is shared across projects and persists indefinitely.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

/// On-disk cache of toolchain releases, keyed by version.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Cache rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        CacheStore { root }
    }

    /// Cache rooted at the per-user default location.
    pub fn default_root() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("dev", "protoforge", "protoforge") {
            return dirs.cache_dir().to_path_buf();
        }
        directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".protoforge"))
            .unwrap_or_else(|| PathBuf::from(".protoforge"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Downloaded release archive for `version`.
    pub fn archive_path(&self, version: &str) -> PathBuf {
        self.root.join(format!("protobuf-{version}.zip"))
    }

    /// Unpacked source tree for `version`.
    pub fn source_dir(&self, version: &str) -> PathBuf {
        self.root.join(format!("protobuf-{version}"))
    }

    /// Include root for compiler invocations: where the source tree
    /// keeps its own bundled interface definitions.
    pub fn include_dir(&self, version: &str) -> PathBuf {
        self.source_dir(version).join("src")
    }

    /// Built compiler executable inside the source tree.
    pub fn protoc_path(&self, version: &str) -> PathBuf {
        self.include_dir(version).join("protoc")
    }

    /// Advisory lock file guarding the entry for `version`.
    pub fn lock_path(&self, version: &str) -> PathBuf {
        self.root.join(format!("protobuf-{version}.lock"))
    }
}

/// Advisory lock on one cache entry.
///
/// Concurrent invocations sharing a cache root can otherwise race on
/// the download or the build; the lock file (holding the owner's PID)
/// serializes them. Opt-in via the `cache_lock` manifest setting.
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
}

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(250);

impl CacheLock {
    /// Block until the lock file at `path` can be created, then hold it
    /// until drop.
    pub fn acquire(path: &Path) -> Result<CacheLock> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut waited = false;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(CacheLock {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if !waited {
                        tracing::info!(
                            "waiting for cache lock {} held by another invocation",
                            path.display()
                        );
                        waited = true;
                    }
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("failed to create lock file: {}", path.display())
                    });
                }
            }
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
