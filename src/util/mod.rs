//! Shared utilities

pub mod fs;
pub mod process;
pub mod shell;

pub use process::{ExecOutput, ProcessBuilder, ProcessRunner, SystemRunner};
pub use shell::{Shell, Status};
