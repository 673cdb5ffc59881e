//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_precheck;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Name of the connection used when none is given.
pub const DEFAULT_CONNECTION: &str = "default";

/// Project configuration from tidemark.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Named database connections
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,

    /// Default connection name
    #[serde(default = "default_connection")]
    pub connection: String,

    /// Precheck strategy name (`allow`, `condition`, `exception`)
    #[serde(default = "default_precheck")]
    pub precheck: String,

    /// Generate SQL without applying it
    #[serde(default)]
    pub dry_run: bool,
}

/// A single database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// DuckDB database path, or `:memory:`
    pub path: String,
}

fn default_connection() -> String {
    DEFAULT_CONNECTION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connections: HashMap::new(),
            connection: default_connection(),
            precheck: default_precheck(),
            dry_run: false,
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for tidemark.yml or tidemark.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("tidemark.yml");
        let yaml_path = dir.join("tidemark.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.precheck.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "precheck strategy name cannot be empty".to_string(),
            });
        }

        if let Some((name, _)) = self
            .connections
            .iter()
            .find(|(_, conn)| conn.path.trim().is_empty())
        {
            return Err(CoreError::ConfigInvalid {
                message: format!("connection '{}' has an empty path", name),
            });
        }

        Ok(())
    }

    /// Look up a connection by name.
    ///
    /// The default connection falls back to an in-memory database when it is
    /// not configured.
    pub fn get_connection(&self, name: &str) -> CoreResult<ConnectionConfig> {
        if let Some(conn) = self.connections.get(name) {
            return Ok(conn.clone());
        }
        if name == DEFAULT_CONNECTION {
            return Ok(ConnectionConfig {
                path: ":memory:".to_string(),
            });
        }

        let mut available: Vec<&str> = self.connections.keys().map(|s| s.as_str()).collect();
        available.sort_unstable();
        Err(CoreError::ConnectionNotFound {
            name: name.to_string(),
            available: if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            },
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
