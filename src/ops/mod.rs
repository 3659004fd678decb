//! Command implementations behind the CLI.

pub mod compile;

pub use compile::{discover_proto_files, run_compile, run_fetch, CompileOptions};
