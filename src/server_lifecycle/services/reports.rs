//! Success reports returned by lifecycle operations.

use crate::server_lifecycle::domain::{
    ActivationId, Classification, DeactivationMode, ServerName, SkipCondition, SubsystemKind,
};
use serde::Serialize;

/// A recipe step that was skipped by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedSubsystem {
    /// Subsystem that was not started.
    pub subsystem: SubsystemKind,
    /// Condition that caused the skip.
    pub reason: SkipCondition,
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Server that was activated.
    pub server_name: ServerName,
    /// Identifier of the new instance.
    pub activation_id: ActivationId,
    /// Classification that selected the recipe.
    pub classification: Classification,
    /// Subsystems started, in startup order.
    pub started: Vec<SubsystemKind>,
    /// Subsystems skipped by policy.
    pub skipped: Vec<SkippedSubsystem>,
    /// Whether a previous instance was stopped first.
    pub restarted: bool,
}

impl ActivationReport {
    /// Returns a one-line human-readable summary.
    #[must_use]
    pub fn message(&self) -> String {
        let verb = if self.restarted {
            "restarted"
        } else {
            "started"
        };
        let started = join_kinds(&self.started);
        let mut message = format!(
            "server {} ({}) {verb} with subsystems: {started}",
            self.server_name,
            self.classification.as_str()
        );
        if !self.skipped.is_empty() {
            let skipped = self
                .skipped
                .iter()
                .map(|entry| format!("{} ({})", entry.subsystem, entry.reason.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str("; skipped: ");
            message.push_str(&skipped);
        }
        message
    }
}

/// Outcome of a deactivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeactivationReport {
    /// Server that was deactivated.
    pub server_name: ServerName,
    /// Requested mode.
    pub mode: DeactivationMode,
    /// Whether a live instance existed.
    pub was_active: bool,
    /// Subsystems shut down, newest first.
    pub stopped: Vec<SubsystemKind>,
    /// Subsystems whose shutdown reported an error.
    pub shutdown_failures: Vec<super::ShutdownFailure>,
    /// Whether the stored configuration was deleted.
    pub configuration_deleted: bool,
}

impl DeactivationReport {
    /// Returns a one-line human-readable summary.
    #[must_use]
    pub fn message(&self) -> String {
        let mut parts = vec![if self.was_active {
            format!(
                "server {} stopped ({}): {}",
                self.server_name,
                self.mode,
                join_kinds(&self.stopped)
            )
        } else {
            format!("server {} was not active", self.server_name)
        }];
        if !self.shutdown_failures.is_empty() {
            parts.push(format!(
                "{} subsystem(s) reported shutdown errors",
                self.shutdown_failures.len()
            ));
        }
        if self.configuration_deleted {
            parts.push("stored configuration deleted".to_owned());
        }
        parts.join("; ")
    }
}

/// A server that could not be stopped during platform shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerShutdownFailure {
    /// Server that failed to stop.
    pub server_name: ServerName,
    /// Diagnostic code of the error.
    pub code: &'static str,
    /// Error description.
    pub message: String,
}

/// Outcome of stopping every registered server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformShutdownReport {
    /// Per-server reports for servers that were stopped.
    pub stopped: Vec<DeactivationReport>,
    /// Servers whose deactivation returned an error.
    pub failures: Vec<ServerShutdownFailure>,
}

impl PlatformShutdownReport {
    /// Returns whether every server stopped without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && self
                .stopped
                .iter()
                .all(|report| report.shutdown_failures.is_empty())
    }
}

fn join_kinds(kinds: &[SubsystemKind]) -> String {
    if kinds.is_empty() {
        return "none".to_owned();
    }
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
