//! ace CLI - native library packaging for ArkUI-X

use std::io::IsTerminal;

use ace::util::diagnostic::{self, Diagnostic};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<Diagnostic>() {
            Some(d) => diagnostic::emit(d, color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("ace=debug")
        } else if cli.quiet {
            EnvFilter::new("ace=error")
        } else {
            EnvFilter::new("ace=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let shell = commands::shell(&cli);

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &shell),
        Commands::Pods(args) => commands::pods::execute(args, &shell),
        Commands::Deps(args) => commands::deps::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
