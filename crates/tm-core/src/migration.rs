//! Migration files: description, dependencies and up/down operations.
//!
//! A migration is a YAML document with a description, the identifiers of the
//! migrations it depends on, and one operation map per direction:
//!
//! ```yaml
//! description: add users
//! dependencies: [001_init]
//! up:
//!   create_table:
//!     users:
//!       id: {type: integer, key: primary}
//! down:
//!   drop_table: [users]
//! ```

use crate::error::{CoreError, CoreResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::path::Path;

/// Direction a migration is run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Parse `up` or `down`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation-type key to raw payload, in file order.
pub type OperationMap = IndexMap<String, Value>;

/// The declarative content of one migration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationSpec {
    #[serde(default)]
    pub description: String,

    /// Migrations that must run first; used by callers, not by the engine
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub up: OperationMap,

    #[serde(default)]
    pub down: OperationMap,
}

impl MigrationSpec {
    /// Parse a migration from YAML text.
    pub fn from_yaml(yaml: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Operations for a direction.
    pub fn operations(&self, direction: Direction) -> &OperationMap {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}

/// A migration loaded from disk; its name is the file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationFile {
    pub name: String,
    pub spec: MigrationSpec,
}

impl MigrationFile {
    /// Load a migration file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::MigrationNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let spec =
            MigrationSpec::from_yaml(&content).map_err(|e| CoreError::MigrationParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::debug!("Loaded migration '{}' from {}", name, path.display());
        Ok(Self { name, spec })
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
