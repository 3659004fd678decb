//! Toolchain acquisition: locate, download, and build the protoc
//! compiler.
//!
//! The provisioner is idempotent: once the built executable exists in
//! the version-keyed cache, every later call is an existence check and
//! nothing else, so it is safe to run on every invocation. Each stage
//! (download, unpack, configure, make) is skipped when its output is
//! already on disk and is fatal when it fails; there are no retries.

pub mod cache;
mod unpack;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use url::Url;

use crate::core::ProtobufConfig;
use crate::util::fs as fsutil;
use crate::util::shell::{Shell, Status};
use crate::util::{ProcessBuilder, ProcessRunner};

pub use cache::{CacheLock, CacheStore};

/// Release download location.
pub const RELEASE_HOST: &str = "https://github.com/google/protobuf/releases/download";

/// Archive file name for a release.
///
/// From the 3.x series on, upstream splits releases per language and
/// the Java archive carries a `-java` infix.
pub fn archive_name(version: &str) -> String {
    if has_java_suffix(version) {
        format!("protobuf-java-{version}.zip")
    } else {
        format!("protobuf-{version}.zip")
    }
}

/// Download URL for a release, reproduced bit-exact so real releases
/// are found: `.../v{version}/{archive}`.
pub fn release_url(version: &str) -> Result<Url> {
    let url = format!("{RELEASE_HOST}/v{version}/{}", archive_name(version));
    Url::parse(&url).with_context(|| format!("invalid release url: {url}"))
}

fn has_java_suffix(version: &str) -> bool {
    match semver::Version::parse(version) {
        Ok(v) => v.major >= 3,
        // Not every historical release string is full semver; fall back
        // to the leading component.
        Err(_) => version
            .split('.')
            .next()
            .and_then(|major| major.parse::<u64>().ok())
            .is_some_and(|major| major >= 3),
    }
}

/// Ensures a usable compiler executable exists, building one from
/// source into the cache when needed.
pub struct Provisioner<'a> {
    store: &'a CacheStore,
    runner: &'a dyn ProcessRunner,
    shell: &'a Shell,
}

impl<'a> Provisioner<'a> {
    pub fn new(store: &'a CacheStore, runner: &'a dyn ProcessRunner, shell: &'a Shell) -> Self {
        Provisioner {
            store,
            runner,
            shell,
        }
    }

    /// Path to a usable compiler executable.
    ///
    /// A user-supplied `protoc` is returned as configured, unchecked.
    /// Otherwise the version-keyed cache entry is used, provisioning it
    /// first (download, unpack, configure, make) if the executable is
    /// not already there.
    pub fn ensure_compiler(&self, config: &ProtobufConfig) -> Result<PathBuf> {
        if let Some(protoc) = &config.protoc {
            tracing::debug!("using configured compiler {}", protoc.display());
            return Ok(protoc.clone());
        }

        let version = &config.version;
        let protoc = self.store.protoc_path(version);
        if protoc.exists() {
            tracing::debug!("compiler already built at {}", protoc.display());
            return Ok(protoc);
        }

        let _lock = self.lock_entry(config)?;
        // Another invocation may have finished the build while we
        // waited on the lock.
        if protoc.exists() {
            return Ok(protoc);
        }

        self.ensure_source_unlocked(version)?;
        self.build_compiler(version)?;

        if !protoc.exists() {
            bail!(
                "toolchain build completed but {} was not produced",
                protoc.display()
            );
        }
        Ok(protoc)
    }

    /// Fetch and unpack the source tree without building the compiler.
    /// Used by the descriptor self-compile, which only needs the
    /// bundled schema sources.
    pub fn ensure_source(&self, config: &ProtobufConfig) -> Result<PathBuf> {
        let _lock = self.lock_entry(config)?;
        self.ensure_source_unlocked(&config.version)?;
        Ok(self.store.source_dir(&config.version))
    }

    fn lock_entry(&self, config: &ProtobufConfig) -> Result<Option<CacheLock>> {
        if config.cache_lock {
            Ok(Some(CacheLock::acquire(
                &self.store.lock_path(&config.version),
            )?))
        } else {
            Ok(None)
        }
    }

    fn ensure_source_unlocked(&self, version: &str) -> Result<()> {
        let archive = self.store.archive_path(version);
        if !archive.exists() {
            self.download(version, &archive)?;
        }

        let srcdir = self.store.source_dir(version);
        if !srcdir.exists() {
            self.shell.status(
                Status::Unpacking,
                archive.file_name().unwrap_or_default().to_string_lossy(),
            );
            unpack::extract_zip(&archive, self.store.root())?;
            if !srcdir.exists() {
                bail!(
                    "archive {} did not unpack to {}",
                    archive.display(),
                    srcdir.display()
                );
            }
        }
        Ok(())
    }

    fn download(&self, version: &str, archive: &Path) -> Result<()> {
        let url = release_url(version)?;
        self.shell.status(Status::Fetching, &url);
        fsutil::ensure_dir(self.store.root())?;

        let mut response = reqwest::blocking::get(url.clone())
            .with_context(|| format!("failed to download {url}"))?;
        if !response.status().is_success() {
            bail!("failed to download {}: HTTP {}", url, response.status());
        }

        let total = response.content_length().unwrap_or(0);
        let progress = self.shell.bytes_progress(archive_name(version), total);

        // Stream into a sibling temp file and rename into place, so a
        // half-finished download never masquerades as a cached archive.
        let mut tmp = tempfile::NamedTempFile::new_in(self.store.root())
            .with_context(|| format!("failed to create temp file in {}", self.store.root().display()))?;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = response
                .read(&mut buf)
                .with_context(|| format!("failed while downloading {url}"))?;
            if n == 0 {
                break;
            }
            tmp.write_all(&buf[..n])
                .with_context(|| format!("failed to write {}", archive.display()))?;
            progress.inc(n as u64);
        }
        progress.finish();

        tmp.persist(archive)
            .with_context(|| format!("failed to move download into {}", archive.display()))?;
        Ok(())
    }

    fn build_compiler(&self, version: &str) -> Result<()> {
        let srcdir = self.store.source_dir(version);

        fsutil::make_executable(&srcdir.join("configure"))?;
        let install_helper = srcdir.join("install-sh");
        if install_helper.exists() {
            fsutil::make_executable(&install_helper)?;
        }

        self.shell
            .status(Status::Building, format!("protoc {version} from source"));
        self.run_build_step(&srcdir, "./configure")?;
        self.run_build_step(&srcdir, "make")?;
        Ok(())
    }

    fn run_build_step(&self, srcdir: &Path, program: &str) -> Result<()> {
        let cmd = ProcessBuilder::new(program).cwd(srcdir);
        tracing::debug!("running `{}` in {}", cmd.display_command(), srcdir.display());

        let output = self.runner.run(&cmd)?;
        if self.shell.is_verbose() && !output.stdout.is_empty() {
            eprintln!("{}", output.stdout);
        }
        if !output.success() {
            bail!(
                "`{}` failed in {} (exit {:?}):\n{}",
                cmd.display_command(),
                srcdir.display(),
                output.code,
                output.stderr
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingRunner;
    use crate::util::ExecOutput;
    use tempfile::TempDir;

    fn config_for(version: &str) -> ProtobufConfig {
        ProtobufConfig {
            version: version.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_archive_name_java_suffix() {
        assert_eq!(archive_name("2.6.1"), "protobuf-2.6.1.zip");
        assert_eq!(archive_name("3.1.0"), "protobuf-java-3.1.0.zip");
    }

    #[test]
    fn test_release_url_shape() {
        let url = release_url("2.6.1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/google/protobuf/releases/download/v2.6.1/protobuf-2.6.1.zip"
        );

        let url = release_url("3.0.0").unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/google/protobuf/releases/download/v3.0.0/protobuf-java-3.0.0.zip"
        );
    }

    #[test]
    fn test_configured_compiler_trusted_unchecked() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());
        let runner = RecordingRunner::new();
        let shell = Shell::default();
        let provisioner = Provisioner::new(&store, &runner, &shell);

        let config = ProtobufConfig {
            protoc: Some(PathBuf::from("/opt/protoc/bin/protoc")),
            ..Default::default()
        };

        // The path does not exist; it is still returned as configured.
        let protoc = provisioner.ensure_compiler(&config).unwrap();
        assert_eq!(protoc, PathBuf::from("/opt/protoc/bin/protoc"));
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_ensure_compiler_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());
        let runner = RecordingRunner::new();
        let shell = Shell::default();
        let provisioner = Provisioner::new(&store, &runner, &shell);

        // Pre-populated cache entry with a built executable.
        let protoc = store.protoc_path("2.6.1");
        std::fs::create_dir_all(protoc.parent().unwrap()).unwrap();
        std::fs::write(&protoc, "#!/bin/sh\n").unwrap();

        let first = provisioner.ensure_compiler(&config_for("2.6.1")).unwrap();
        let second = provisioner.ensure_compiler(&config_for("2.6.1")).unwrap();

        assert_eq!(first, protoc);
        assert_eq!(second, protoc);
        // No download, no unpack, no configure, no make.
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_build_runs_configure_then_make() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        // Simulate an already-fetched archive and unpacked tree.
        let srcdir = store.source_dir("2.6.1");
        std::fs::create_dir_all(srcdir.join("src")).unwrap();
        std::fs::write(srcdir.join("configure"), "#!/bin/sh\n").unwrap();
        std::fs::write(store.archive_path("2.6.1"), "zip").unwrap();

        let protoc = store.protoc_path("2.6.1");
        let protoc_for_handler = protoc.clone();
        let runner = RecordingRunner::with_handler(move |cmd| {
            // `make` produces the executable.
            if cmd.get_program() == Path::new("make") {
                std::fs::write(&protoc_for_handler, "#!/bin/sh\n").unwrap();
            }
            ExecOutput::ok()
        });
        let shell = Shell::default();
        let provisioner = Provisioner::new(&store, &runner, &shell);

        let built = provisioner.ensure_compiler(&config_for("2.6.1")).unwrap();
        assert_eq!(built, protoc);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].get_program(), Path::new("./configure"));
        assert_eq!(calls[0].get_cwd(), Some(srcdir.as_path()));
        assert_eq!(calls[1].get_program(), Path::new("make"));
        assert_eq!(calls[1].get_cwd(), Some(srcdir.as_path()));

        // Re-invocation after a successful build is a no-op.
        let again = provisioner.ensure_compiler(&config_for("2.6.1")).unwrap();
        assert_eq!(again, protoc);
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn test_build_failure_surfaces_stderr() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        let srcdir = store.source_dir("2.6.1");
        std::fs::create_dir_all(&srcdir).unwrap();
        std::fs::write(srcdir.join("configure"), "#!/bin/sh\n").unwrap();
        std::fs::write(store.archive_path("2.6.1"), "zip").unwrap();

        let runner =
            RecordingRunner::with_handler(|_| ExecOutput::failed(1, "missing autotools"));
        let shell = Shell::default();
        let provisioner = Provisioner::new(&store, &runner, &shell);

        let err = provisioner
            .ensure_compiler(&config_for("2.6.1"))
            .unwrap_err();
        assert!(err.to_string().contains("missing autotools"));
        // Fail-fast: make never ran after configure failed.
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn test_ensure_source_skips_build() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        let srcdir = store.source_dir("2.6.1");
        std::fs::create_dir_all(&srcdir).unwrap();
        std::fs::write(store.archive_path("2.6.1"), "zip").unwrap();

        let runner = RecordingRunner::new();
        let shell = Shell::default();
        let provisioner = Provisioner::new(&store, &runner, &shell);

        let dir = provisioner.ensure_source(&config_for("2.6.1")).unwrap();
        assert_eq!(dir, srcdir);
        assert_eq!(runner.call_count(), 0);
    }
}
