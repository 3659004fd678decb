//! Command implementations

pub mod clean;
pub mod compile;
pub mod completions;
pub mod fetch;

use std::path::PathBuf;

use anyhow::{Context, Result};

use protoforge::Manifest;

/// Load the manifest governing the working directory, defaulting when
/// none exists.
pub fn load_project() -> Result<(Manifest, PathBuf)> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let (manifest, root) = Manifest::load_or_default(&cwd)?;
    Ok((manifest, root))
}
