//! In-memory audit log.

use crate::server_lifecycle::{
    domain::{LifecycleEvent, LifecycleEventKind, ServerName},
    ports::LifecycleAuditLog,
};
use std::sync::{Arc, PoisonError, RwLock};

/// Audit log that keeps every event in memory, in recording order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    events: Arc<RwLock<Vec<LifecycleEvent>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the event kinds recorded for one server.
    #[must_use]
    pub fn kinds_for(&self, server: &ServerName) -> Vec<LifecycleEventKind> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| &event.server_name == server)
            .map(|event| event.kind.clone())
            .collect()
    }
}

impl LifecycleAuditLog for InMemoryAuditLog {
    fn record(&self, event: LifecycleEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
