//! Operational status of subsystems and server instances.

use super::ParseSubsystemStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational status shared by subsystems and whole instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubsystemStatus {
    /// Initialization is in progress.
    Starting,
    /// Initialization completed and the subsystem is serving.
    Running,
    /// Shutdown is in progress.
    Stopping,
    /// Not running.
    Inactive,
}

impl SubsystemStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Inactive => "INACTIVE",
        }
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// `Starting -> Stopping` covers the unwind of a subsystem whose
    /// initialization failed or was abandoned.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Inactive, Self::Starting)
                | (Self::Starting | Self::Running, Self::Stopping)
                | (Self::Starting, Self::Running)
                | (Self::Stopping, Self::Inactive)
        )
    }

    /// Returns whether the subsystem may hold live resources.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

impl fmt::Display for SubsystemStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SubsystemStatus {
    type Error = ParseSubsystemStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "STARTING" => Ok(Self::Starting),
            "RUNNING" => Ok(Self::Running),
            "STOPPING" => Ok(Self::Stopping),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(ParseSubsystemStatusError(value.to_owned())),
        }
    }
}

/// How far a deactivation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationMode {
    /// Stop all subsystems and keep the stored configuration.
    Temporary,
    /// Stop all subsystems and delete the stored configuration.
    Permanent,
}

impl DeactivationMode {
    /// Returns whether stored configuration is deleted.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temporary => "temporary",
            Self::Permanent => "permanent",
        }
    }
}

impl fmt::Display for DeactivationMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
