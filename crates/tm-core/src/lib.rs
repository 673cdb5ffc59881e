//! tm-core - Core library for Tidemark
//!
//! This crate provides shared types for schema migrations: identifiers,
//! table and field definitions, the operation vocabulary, migration files,
//! and project configuration.

pub mod alteration;
pub mod config;
pub mod error;
pub mod migration;
pub mod names;
pub(crate) mod newtype_string;
pub mod operation;
pub mod schema;
pub(crate) mod serde_helpers;

pub use alteration::{AlterationKind, AlterationSet, DefinitionBucket, DropBucket};
pub use config::{Config, ConnectionConfig, DEFAULT_CONNECTION};
pub use error::{CoreError, CoreResult};
pub use migration::{Direction, MigrationFile, MigrationSpec, OperationMap};
pub use names::{FieldName, IndexName, TableName};
pub use operation::{FieldRequest, FieldRequests, IndexRequest, Operation, OperationType};
pub use schema::{FieldDef, IndexDef, KeyKind, TableDef, TableParameters};
