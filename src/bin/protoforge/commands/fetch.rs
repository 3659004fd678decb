//! `protoforge fetch` command

use anyhow::Result;

use crate::cli::FetchArgs;
use protoforge::ops::run_fetch;
use protoforge::util::Shell;

pub fn execute(_args: FetchArgs, shell: &Shell) -> Result<()> {
    let (manifest, _project_root) = super::load_project()?;

    run_fetch(&manifest, shell)?;
    Ok(())
}
