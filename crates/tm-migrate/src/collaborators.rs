//! Environment collaborators invoked once a run has executed.

/// Clears caches derived from the schema
pub trait CacheInvalidator {
    fn clear_all(&self);
}

/// Re-reads persisted migration version state
pub trait VersionTracker {
    fn refresh(&self);
}
