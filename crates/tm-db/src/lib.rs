//! tm-db - Database layer for Tidemark
//!
//! This crate provides the `Connection` and `SchemaBuilder` contracts the
//! migration engine runs against, and their DuckDB implementations.

pub mod builder;
pub mod duckdb;
pub mod error;
pub mod traits;
pub mod types;

pub use builder::DuckDbSchemaBuilder;
pub use duckdb::DuckDbConnection;
pub use error::{DbError, DbResult};
pub use traits::{Connection, SchemaBuilder};
