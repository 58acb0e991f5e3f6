//! Audit log adapter that forwards events to `tracing`.

use crate::server_lifecycle::{
    domain::{LifecycleEvent, LifecycleEventKind},
    ports::LifecycleAuditLog,
};
use tracing::{info, warn};

/// Emits every lifecycle event as a structured `tracing` event.
///
/// Failure events are logged at `warn`, everything else at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

impl LifecycleAuditLog for TracingAuditLog {
    fn record(&self, event: LifecycleEvent) {
        let activation = event
            .activation_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let details = serde_json::to_string(&event.kind).unwrap_or_default();
        let is_failure = matches!(
            event.kind,
            LifecycleEventKind::ActivationFailed { .. }
                | LifecycleEventKind::RollbackFailed { .. }
                | LifecycleEventKind::ShutdownFailed { .. }
        );
        if is_failure {
            warn!(
                target: "caisson::audit",
                server = %event.server_name,
                activation = %activation,
                occurred_at = %event.occurred_at,
                details = %details,
                "lifecycle event"
            );
        } else {
            info!(
                target: "caisson::audit",
                server = %event.server_name,
                activation = %activation,
                occurred_at = %event.occurred_at,
                details = %details,
                "lifecycle event"
            );
        }
    }
}
