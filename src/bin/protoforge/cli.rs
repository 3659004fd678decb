//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Protoforge - a build-time orchestrator for Protocol Buffer code generation
#[derive(Parser)]
#[command(name = "protoforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile interface definitions into generated Java sources
    Compile(CompileArgs),

    /// Download and build the protoc toolchain without compiling
    Fetch(FetchArgs),

    /// Remove generated output directories
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CompileArgs {
    /// Files to compile, relative to the proto root (all discovered
    /// when empty)
    pub files: Vec<PathBuf>,

    /// Fail on imports that cannot be resolved anywhere
    #[arg(long)]
    pub strict_imports: bool,
}

#[derive(Args)]
pub struct FetchArgs {}

#[derive(Args)]
pub struct CleanArgs {}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
