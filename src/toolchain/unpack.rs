//! Zip extraction for toolchain release archives.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Extract a zip archive into `dest`.
///
/// Entry paths are validated against escaping the destination. Unix
/// permission bits recorded in the archive are preserved.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read archive: {}", archive.display()))?;

    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .with_context(|| format!("failed to read entry {i} of {}", archive.display()))?;

        let Some(relative) = entry.enclosed_name() else {
            bail!("archive entry escapes destination directory: {}", entry.name());
        };
        let output_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path).with_context(|| {
                format!("failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut out = File::create(&output_path)
            .with_context(|| format!("failed to create file: {}", output_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract: {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&output_path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("failed to chmod {}", output_path.display()))?;
        }
    }

    Ok(())
}
