//! Project manifest (`Protoforge.toml`) loading.
//!
//! The manifest is optional: every setting has a default, so the CLI
//! works in a bare directory. When present it is discovered by walking
//! upward from the working directory.
//!
//! ```toml
//! [project]
//! name = "my-service"
//!
//! [protobuf]
//! version = "2.6.1"
//! proto_path = "resources/proto"
//! strict_imports = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Protoforge.toml";

/// Toolchain release used when the manifest does not pin one.
pub const DEFAULT_PROTOBUF_VERSION: &str = "2.6.1";

/// Default root scanned for interface-definition files.
pub const DEFAULT_PROTO_PATH: &str = "resources/proto";

/// Default base of the generated output tree.
pub const DEFAULT_TARGET_PATH: &str = "target";

/// Project name that triggers the descriptor self-compile: the protobuf
/// core library generates its own reflective schema bindings before
/// anything else can compile.
pub const BOOTSTRAP_PROJECT_NAME: &str = "protobuf";

/// Errors from manifest discovery and parsing.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no Protoforge.toml found searching upward from {}", dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Staleness strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalenessMode {
    /// Aggregate modification-time comparison (original semantics).
    #[default]
    Mtime,
    /// Content-hash digest against a stamp file in the output tree.
    Hash,
}

/// The whole `Protoforge.toml` manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub project: ProjectSection,
    pub protobuf: ProtobufConfig,
}

/// `[project]` metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub name: Option<String>,
}

/// `[protobuf]` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtobufConfig {
    /// Toolchain release version.
    pub version: String,

    /// Pre-installed compiler executable; bypasses provisioning
    /// entirely and is trusted as configured. The `-I` include root is
    /// still derived from the version-keyed cache source tree, so a
    /// fetched tree must exist for imports of bundled well-known types
    /// to resolve through the compiler.
    pub protoc: Option<PathBuf>,

    /// Root directory scanned for interface-definition files, relative
    /// to the project root unless absolute.
    pub proto_path: PathBuf,

    /// Base of the generated output tree.
    pub target_path: PathBuf,

    /// Make unresolvable imports fatal instead of silently skipped.
    pub strict_imports: bool,

    /// Staleness strategy.
    pub staleness: StalenessMode,

    /// Take an advisory lock on the version-keyed cache entry while
    /// provisioning. Off by default so the single-user path pays
    /// nothing.
    pub cache_lock: bool,

    /// Override of the per-user toolchain cache root.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ProtobufConfig {
    fn default() -> Self {
        ProtobufConfig {
            version: DEFAULT_PROTOBUF_VERSION.to_string(),
            protoc: None,
            proto_path: PathBuf::from(DEFAULT_PROTO_PATH),
            target_path: PathBuf::from(DEFAULT_TARGET_PATH),
            strict_imports: false,
            staleness: StalenessMode::default(),
            cache_lock: false,
            cache_dir: None,
        }
    }
}

impl ProtobufConfig {
    /// Proto root resolved against the project root.
    pub fn proto_root(&self, project_root: &Path) -> PathBuf {
        resolve(project_root, &self.proto_path)
    }

    /// Target root resolved against the project root.
    pub fn target_root(&self, project_root: &Path) -> PathBuf {
        resolve(project_root, &self.target_path)
    }
}

fn resolve(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

impl Manifest {
    /// Load the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find `Protoforge.toml` starting at `start` and searching upward.
    pub fn find(start: &Path) -> Result<PathBuf, ManifestError> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(MANIFEST_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: start.to_path_buf(),
                });
            }
        }
    }

    /// Load the manifest governing `start`, or defaults when none is
    /// found. Returns the manifest together with the project root it
    /// was resolved against.
    pub fn load_or_default(start: &Path) -> Result<(Self, PathBuf), ManifestError> {
        match Self::find(start) {
            Ok(path) => {
                let root = path.parent().unwrap_or(start).to_path_buf();
                Ok((Self::load(&path)?, root))
            }
            Err(ManifestError::NotFound { .. }) => {
                Ok((Manifest::default(), start.to_path_buf()))
            }
            Err(e) => Err(e),
        }
    }

    /// Project name, if declared.
    pub fn name(&self) -> Option<&str> {
        self.project.name.as_deref()
    }

    /// Whether this project is the toolchain core library itself and
    /// needs the descriptor self-compile.
    pub fn is_bootstrap(&self) -> bool {
        self.name() == Some(BOOTSTRAP_PROJECT_NAME)
    }
}
