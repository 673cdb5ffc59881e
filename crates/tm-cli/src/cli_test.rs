use super::*;
use clap::{CommandFactory, Parser};

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_run_defaults() {
    let cli = Cli::try_parse_from(["tm", "run", "migrations/001_users.yml"]).unwrap();
    let Commands::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(args.file, "migrations/001_users.yml");
    assert_eq!(args.direction, "up");
    assert!(!args.dry_run);
    assert_eq!(args.precheck, None);
    assert_eq!(args.output, OutputFormat::Text);
    assert_eq!(cli.global.project_dir, ".");
}

#[test]
fn test_run_flags() {
    let cli = Cli::try_parse_from([
        "tm",
        "--verbose",
        "run",
        "m.yml",
        "--direction",
        "down",
        "--dry-run",
        "--precheck",
        "condition",
        "--connection",
        "staging",
        "--output",
        "json",
    ])
    .unwrap();
    assert!(cli.global.verbose);
    let Commands::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(args.direction, "down");
    assert!(args.dry_run);
    assert_eq!(args.precheck.as_deref(), Some("condition"));
    assert_eq!(args.connection.as_deref(), Some("staging"));
    assert_eq!(args.output, OutputFormat::Json);
}

#[test]
fn test_validate_accepts_many_files() {
    let cli = Cli::try_parse_from(["tm", "validate", "a.yml", "b.yml"]).unwrap();
    let Commands::Validate(args) = cli.command else {
        panic!("expected validate command");
    };
    assert_eq!(args.files, vec!["a.yml", "b.yml"]);
}

#[test]
fn test_run_requires_file() {
    assert!(Cli::try_parse_from(["tm", "run"]).is_err());
}
