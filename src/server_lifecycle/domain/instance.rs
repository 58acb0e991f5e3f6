//! Live record of one activated server.

use super::{
    ActivationId, Classification, ConfigurationFingerprint, LifecycleDomainError,
    ServerConfiguration, ServerName, SubsystemKind, SubsystemStatus,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;

/// Status of one subsystem within an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubsystemEntry {
    kind: SubsystemKind,
    status: SubsystemStatus,
}

impl SubsystemEntry {
    /// Returns the subsystem tag.
    #[must_use]
    pub const fn kind(&self) -> SubsystemKind {
        self.kind
    }

    /// Returns the subsystem status.
    #[must_use]
    pub const fn status(&self) -> SubsystemStatus {
        self.status
    }
}

/// Read-only view of an instance served to status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveStatus {
    /// Server the status describes.
    pub server_name: ServerName,
    /// Activation that produced the instance.
    pub activation_id: ActivationId,
    /// Classification derived at activation time.
    pub classification: Classification,
    /// Aggregated status.
    pub overall_status: SubsystemStatus,
    /// Per-subsystem status in startup order.
    pub subsystems: Vec<SubsystemEntry>,
    /// Fingerprint of the configuration the instance runs with.
    pub fingerprint: ConfigurationFingerprint,
    /// When activation began.
    pub started_at: DateTime<Utc>,
    /// When any status last changed.
    pub updated_at: DateTime<Utc>,
}

/// Live record of one active server.
///
/// The record only holds status and the configuration snapshot; subsystem
/// handles stay with the orchestrator that started them.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationalInstance {
    activation_id: ActivationId,
    server_name: ServerName,
    classification: Classification,
    overall_status: SubsystemStatus,
    subsystems: Vec<SubsystemEntry>,
    configuration: ServerConfiguration,
    fingerprint: ConfigurationFingerprint,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OperationalInstance {
    /// Creates an instance in `STARTING` state for the given snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::UnserializableConfiguration`] when the
    /// snapshot cannot be fingerprinted.
    pub fn starting(
        server_name: ServerName,
        classification: Classification,
        configuration: ServerConfiguration,
        clock: &impl Clock,
    ) -> Result<Self, LifecycleDomainError> {
        let fingerprint = configuration.fingerprint()?;
        let timestamp = clock.utc();
        Ok(Self {
            activation_id: ActivationId::new(),
            server_name,
            classification,
            overall_status: SubsystemStatus::Starting,
            subsystems: Vec::new(),
            configuration,
            fingerprint,
            started_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the activation identifier.
    #[must_use]
    pub const fn activation_id(&self) -> ActivationId {
        self.activation_id
    }

    /// Returns the server name.
    #[must_use]
    pub const fn server_name(&self) -> &ServerName {
        &self.server_name
    }

    /// Returns the classification.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Returns the aggregated status.
    #[must_use]
    pub const fn overall_status(&self) -> SubsystemStatus {
        self.overall_status
    }

    /// Returns per-subsystem status in startup order.
    #[must_use]
    pub fn subsystems(&self) -> &[SubsystemEntry] {
        &self.subsystems
    }

    /// Returns the configuration snapshot the instance was started with.
    #[must_use]
    pub const fn configuration(&self) -> &ServerConfiguration {
        &self.configuration
    }

    /// Returns the snapshot fingerprint.
    #[must_use]
    pub const fn fingerprint(&self) -> &ConfigurationFingerprint {
        &self.fingerprint
    }

    /// Returns the status of one subsystem.
    #[must_use]
    pub fn subsystem_status(&self, kind: SubsystemKind) -> Option<SubsystemStatus> {
        self.subsystems
            .iter()
            .find(|entry| entry.kind == kind)
            .map(SubsystemEntry::status)
    }

    /// Returns subsystems that may hold resources, newest first.
    #[must_use]
    pub fn live_subsystems_newest_first(&self) -> Vec<SubsystemKind> {
        self.subsystems
            .iter()
            .rev()
            .filter(|entry| entry.status.is_live())
            .map(SubsystemEntry::kind)
            .collect()
    }

    /// Builds the read-only status view.
    #[must_use]
    pub fn status_report(&self) -> ActiveStatus {
        ActiveStatus {
            server_name: self.server_name.clone(),
            activation_id: self.activation_id,
            classification: self.classification,
            overall_status: self.overall_status,
            subsystems: self.subsystems.clone(),
            fingerprint: self.fingerprint.clone(),
            started_at: self.started_at,
            updated_at: self.updated_at,
        }
    }

    /// Starts tracking a subsystem in `STARTING` state.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidStatusTransition`] when the
    /// subsystem is already tracked in a state other than `INACTIVE`.
    pub fn mark_subsystem_starting(
        &mut self,
        kind: SubsystemKind,
        clock: &impl Clock,
    ) -> Result<(), LifecycleDomainError> {
        match self.subsystems.iter_mut().find(|entry| entry.kind == kind) {
            Some(entry) => {
                transition(&kind.to_string(), &mut entry.status, SubsystemStatus::Starting)?;
            }
            None => self.subsystems.push(SubsystemEntry {
                kind,
                status: SubsystemStatus::Starting,
            }),
        }
        self.touch(clock);
        Ok(())
    }

    /// Marks a tracked subsystem `RUNNING`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError`] for unknown subsystems or invalid
    /// transitions.
    pub fn mark_subsystem_running(
        &mut self,
        kind: SubsystemKind,
        clock: &impl Clock,
    ) -> Result<(), LifecycleDomainError> {
        self.move_subsystem(kind, SubsystemStatus::Running, clock)
    }

    /// Marks a tracked subsystem `STOPPING`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError`] for unknown subsystems or invalid
    /// transitions.
    pub fn mark_subsystem_stopping(
        &mut self,
        kind: SubsystemKind,
        clock: &impl Clock,
    ) -> Result<(), LifecycleDomainError> {
        self.move_subsystem(kind, SubsystemStatus::Stopping, clock)
    }

    /// Marks a tracked subsystem `INACTIVE`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError`] for unknown subsystems or invalid
    /// transitions.
    pub fn mark_subsystem_inactive(
        &mut self,
        kind: SubsystemKind,
        clock: &impl Clock,
    ) -> Result<(), LifecycleDomainError> {
        self.move_subsystem(kind, SubsystemStatus::Inactive, clock)
    }

    /// Marks the whole instance `RUNNING`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidStatusTransition`] unless the
    /// instance is `STARTING`.
    pub fn mark_running(&mut self, clock: &impl Clock) -> Result<(), LifecycleDomainError> {
        self.move_overall(SubsystemStatus::Running, clock)
    }

    /// Marks the whole instance `STOPPING`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidStatusTransition`] unless the
    /// instance is `STARTING` or `RUNNING`.
    pub fn mark_stopping(&mut self, clock: &impl Clock) -> Result<(), LifecycleDomainError> {
        self.move_overall(SubsystemStatus::Stopping, clock)
    }

    /// Marks the whole instance `INACTIVE`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidStatusTransition`] unless the
    /// instance is `STOPPING`.
    pub fn mark_inactive(&mut self, clock: &impl Clock) -> Result<(), LifecycleDomainError> {
        self.move_overall(SubsystemStatus::Inactive, clock)
    }

    fn move_subsystem(
        &mut self,
        kind: SubsystemKind,
        target: SubsystemStatus,
        clock: &impl Clock,
    ) -> Result<(), LifecycleDomainError> {
        let entry = self
            .subsystems
            .iter_mut()
            .find(|entry| entry.kind == kind)
            .ok_or(LifecycleDomainError::UnknownSubsystem(kind))?;
        transition(&kind.to_string(), &mut entry.status, target)?;
        self.touch(clock);
        Ok(())
    }

    fn move_overall(
        &mut self,
        target: SubsystemStatus,
        clock: &impl Clock,
    ) -> Result<(), LifecycleDomainError> {
        let subject = self.server_name.to_string();
        transition(&subject, &mut self.overall_status, target)?;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn transition(
    subject: &str,
    current: &mut SubsystemStatus,
    target: SubsystemStatus,
) -> Result<(), LifecycleDomainError> {
    if !current.can_transition_to(target) {
        return Err(LifecycleDomainError::InvalidStatusTransition {
            subject: subject.to_owned(),
            from: current.as_str().to_owned(),
            to: target.as_str().to_owned(),
        });
    }
    *current = target;
    Ok(())
}
