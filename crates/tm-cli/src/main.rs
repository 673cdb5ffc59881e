//! Tidemark CLI - apply YAML schema migrations to a database

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::common::ExitCode;
use commands::{describe, run, validate};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = dispatch(&cli) {
        if let Some(ExitCode(code)) = err.downcast_ref::<ExitCode>() {
            std::process::exit(*code);
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Run(args) => run::execute(args, &cli.global),
        cli::Commands::Validate(args) => validate::execute(args, &cli.global),
        cli::Commands::Describe(args) => describe::execute(args, &cli.global),
    }
}

/// RUST_LOG still wins when set.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
