//! Error types for tm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table not found: {0}")]
    TableNotFound(String),

    /// Introspection query failed (D004)
    #[error("[D004] Schema introspection failed: {0}")]
    IntrospectionError(String),

    /// BEGIN/COMMIT/ROLLBACK failed (D005)
    #[error("[D005] Transaction {operation} failed: {message}")]
    TransactionError { operation: String, message: String },
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error carries no structured catalog variants, so missing
        // tables are recognised by message.
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
