//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tidemark - apply YAML schema migrations to a database
#[derive(Parser, Debug)]
#[command(name = "tm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply one direction of a migration file
    Run(RunArgs),

    /// Parse migration files and report their execution order
    Validate(ValidateArgs),

    /// Show tables, or one table's columns and indexes
    Describe(DescribeArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Migration file to apply
    pub file: String,

    /// Direction to run (up or down)
    #[arg(short, long, default_value = "up")]
    pub direction: String,

    /// Print the generated SQL without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Precheck strategy (allow, condition, exception)
    #[arg(long)]
    pub precheck: Option<String>,

    /// Named connection from tidemark.yml
    #[arg(long, env = "TIDEMARK_CONNECTION")]
    pub connection: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Migration files to validate (default: migrations/*.yml under the project)
    pub files: Vec<String>,
}

/// Arguments for the describe command
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Table to describe (default: list tables)
    pub table: Option<String>,

    /// Named connection from tidemark.yml
    #[arg(long, env = "TIDEMARK_CONNECTION")]
    pub connection: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
