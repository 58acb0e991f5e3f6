//! Lifecycle audit events.

use super::{
    ActivationId, Classification, DeactivationMode, ServerName, SkipCondition, SubsystemKind,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened during a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEventKind {
    /// Activation began for a classified configuration.
    ActivationStarted {
        /// Classification that selected the recipe.
        classification: Classification,
    },
    /// A subsystem finished initializing.
    SubsystemStarted {
        /// Subsystem that started.
        subsystem: SubsystemKind,
    },
    /// A subsystem was skipped by policy.
    SubsystemSkipped {
        /// Subsystem that was skipped.
        subsystem: SubsystemKind,
        /// Condition that held.
        reason: SkipCondition,
    },
    /// All subsystems started.
    ActivationCompleted {
        /// Subsystems started, in order.
        started: Vec<SubsystemKind>,
    },
    /// Activation aborted.
    ActivationFailed {
        /// Subsystem whose step failed, when the failure was in a step.
        subsystem: Option<SubsystemKind>,
        /// Failure description.
        message: String,
    },
    /// A subsystem failed to shut down while unwinding a failed activation.
    RollbackFailed {
        /// Subsystem that failed.
        subsystem: SubsystemKind,
        /// Failure description.
        message: String,
    },
    /// A subsystem was shut down.
    SubsystemStopped {
        /// Subsystem that stopped.
        subsystem: SubsystemKind,
    },
    /// A subsystem reported an error while shutting down.
    ShutdownFailed {
        /// Subsystem that failed.
        subsystem: SubsystemKind,
        /// Failure description.
        message: String,
    },
    /// The instance was removed from the registry.
    DeactivationCompleted {
        /// Deactivation mode.
        mode: DeactivationMode,
    },
    /// The stored configuration was deleted.
    ConfigurationDeleted,
}

/// Timestamped lifecycle event for one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    /// Server the event concerns.
    pub server_name: ServerName,
    /// Activation the event belongs to, when an instance exists.
    pub activation_id: Option<ActivationId>,
    /// When the event was recorded.
    pub occurred_at: DateTime<Utc>,
    /// Event details.
    pub kind: LifecycleEventKind,
}
