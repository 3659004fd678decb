//! `protoforge compile` command

use anyhow::Result;

use crate::cli::CompileArgs;
use protoforge::ops::{run_compile, CompileOptions};
use protoforge::util::Shell;

pub fn execute(args: CompileArgs, shell: &Shell) -> Result<()> {
    let (manifest, project_root) = super::load_project()?;

    let opts = CompileOptions {
        files: args.files,
        strict_imports: args.strict_imports,
    };

    run_compile(&manifest, &project_root, shell, &opts)?;
    Ok(())
}
