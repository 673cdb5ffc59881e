//! Error types for tm-migrate

use crate::hooks::HookPhase;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tm_core::CoreError;
use tm_db::DbError;

/// Stage of a run in which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Begin,
    BeforeMigration,
    Dispatch,
    Flush,
    AfterMigration,
    Commit,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Begin => "begin",
            RunPhase::BeforeMigration => "before migration",
            RunPhase::Dispatch => "dispatch",
            RunPhase::Flush => "flush",
            RunPhase::AfterMigration => "after migration",
            RunPhase::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Migration engine errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Direction is neither `up` nor `down` (MG001)
    #[error("[MG001] Invalid migration direction '{0}': expected 'up' or 'down'")]
    InvalidDirection(String),

    /// Operation key outside the recognized set (MG002)
    #[error("[MG002] Migration action type '{0}' is not one of the valid operation types")]
    InvalidOperationType(String),

    /// Operation payload could not be parsed (MG003)
    #[error("[MG003] {0}")]
    InvalidPayload(#[from] CoreError),

    /// Configured precheck strategy is not registered (MG004)
    #[error("[MG004] Precheck strategy '{name}' could not be loaded: {message}")]
    PrecheckLoadFailure { name: String, message: String },

    /// A strict precheck rejected an action (MG005)
    #[error("[MG005] Precheck failed for {action}: {message}")]
    PrecheckFailed { action: String, message: String },

    /// A before/after migration hook returned false (MG006)
    #[error("[MG006] Interrupted when running \"{phase}\" callback")]
    HookAbort { phase: HookPhase },

    /// Driver rejected a statement (MG007)
    #[error("[MG007] SQL Error: {message}")]
    SqlExecution { message: String, sql: String },

    /// BEGIN/COMMIT failed (MG008)
    #[error("[MG008] {0}")]
    Transaction(#[source] DbError),

    /// Reading the live schema failed (MG009)
    #[error("[MG009] {0}")]
    Introspection(#[source] DbError),

    /// Any failure inside a run, with the migration and phase attached (MG010)
    #[error("[MG010] Migration '{migration}' failed during {phase}: {source}")]
    Migration {
        migration: String,
        phase: RunPhase,
        #[source]
        source: Box<MigrateError>,
    },
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    /// The underlying cause, looking through `Migration` wrappers.
    pub fn root(&self) -> &MigrateError {
        match self {
            MigrateError::Migration { source, .. } => source.root(),
            other => other,
        }
    }

    /// Phase recorded by the run controller, if any
    pub fn phase(&self) -> Option<RunPhase> {
        match self {
            MigrateError::Migration { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
