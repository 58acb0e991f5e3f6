//! Audit port receiving lifecycle events.

use crate::server_lifecycle::domain::LifecycleEvent;

/// Sink for lifecycle audit events.
///
/// Recording never fails from the caller's point of view; sinks that can
/// fail must handle that internally.
pub trait LifecycleAuditLog: Send + Sync {
    /// Records one event.
    fn record(&self, event: LifecycleEvent);
}
