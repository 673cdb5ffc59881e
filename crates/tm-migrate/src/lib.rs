//! tm-migrate - Migration engine for Tidemark
//!
//! Applies one direction of a migration to a live database: operations are
//! ordered, whole-table operations run immediately, field and index changes
//! are accumulated per table and flushed as one statement per table, all in
//! a single transaction that is rolled back on any failure.

pub mod accumulate;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod flush;
pub mod hooks;
pub mod migrator;
pub mod order;
pub mod precheck;
pub mod structural;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{CacheInvalidator, VersionTracker};
pub use context::ExecutionContext;
pub use error::{MigrateError, MigrateResult, RunPhase};
pub use hooks::{
    Action, ActionData, ActionKind, Callback, DefaultHooks, HookDispatcher, HookPhase,
    MigrationHooks,
};
pub use migrator::{Migration, MigrationOptions, Migrator, RunReport, RunState};
pub use order::{order_operations, plan};
pub use precheck::{
    AllowAll, Precheck, PrecheckCondition, PrecheckException, PrecheckRegistry, DEFAULT_PRECHECK,
};
