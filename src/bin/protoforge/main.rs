//! Protoforge CLI - protobuf code generation orchestrator

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use protoforge::util::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("protoforge=debug")
    } else {
        EnvFilter::new("protoforge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(cli.verbose, cli.no_color);

    // Execute command
    match cli.command {
        Commands::Compile(args) => commands::compile::execute(args, &shell),
        Commands::Fetch(args) => commands::fetch::execute(args, &shell),
        Commands::Clean(args) => commands::clean::execute(args, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
