//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tm_core::{Config, CoreError};
use tm_db::DuckDbConnection;

use crate::cli::GlobalArgs;

/// Loaded configuration plus where it came from
pub(crate) struct RuntimeContext {
    /// Project configuration (defaults when no tidemark.yml exists)
    pub config: Config,

    /// Project root, used to resolve relative paths
    pub project_dir: PathBuf,

    /// Verbose output enabled
    pub verbose: bool,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let project_dir = PathBuf::from(&args.project_dir);

        let config = match &args.config {
            Some(path) => {
                Config::load(Path::new(path)).context("Failed to load configuration file")?
            }
            None => match Config::load_from_dir(&project_dir) {
                Ok(config) => config,
                Err(CoreError::ConfigNotFound { path }) => {
                    log::debug!("No configuration at {path}, using defaults");
                    Config::default()
                }
                Err(e) => return Err(e).context("Failed to load project configuration"),
            },
        };

        Ok(Self {
            config,
            project_dir,
            verbose: args.verbose,
        })
    }

    /// Name of the connection to use, preferring an explicit override.
    pub fn connection_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.config.connection)
    }

    /// Open a named connection. Relative database paths resolve against the
    /// project directory.
    pub fn connect(&self, name: &str) -> Result<DuckDbConnection> {
        let conn_config = self.config.get_connection(name)?;
        let path = self.resolve_path(&conn_config.path);
        log::debug!("Opening connection '{}' at {}", name, path);
        DuckDbConnection::new(&path)
            .with_context(|| format!("Failed to connect to database '{}'", name))
    }

    /// Resolve a user-supplied path against the project directory.
    pub fn resolve_path(&self, path: &str) -> String {
        if path == ":memory:" || Path::new(path).is_absolute() {
            path.to_string()
        } else {
            self.project_dir.join(path).display().to_string()
        }
    }

    /// Print verbose output if enabled
    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }
}
