//! `protoforge clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use protoforge::util::fs::remove_dir_all_if_exists;
use protoforge::util::{Shell, Status};
use protoforge::TargetLayout;

pub fn execute(_args: CleanArgs, shell: &Shell) -> Result<()> {
    let (manifest, project_root) = super::load_project()?;

    let target_root = manifest.protobuf.target_root(&project_root);
    let layout = TargetLayout::new(&target_root);

    for dir in [layout.generated(), layout.proto(), layout.classes()] {
        if dir.exists() {
            remove_dir_all_if_exists(dir)?;
            shell.status(Status::Removed, dir.display());
        }
    }

    Ok(())
}
