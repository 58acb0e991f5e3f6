//! Errors surfaced by lifecycle orchestration.

use super::registry::RegistryError;
use crate::server_lifecycle::{
    domain::{LifecycleDomainError, ServerName, SubsystemKind},
    ports::{AuthorizationError, ConfigurationStoreError},
};
use serde::Serialize;
use thiserror::Error;

/// Result type for lifecycle service operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A subsystem that reported an error while being shut down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownFailure {
    /// Subsystem whose shutdown failed.
    pub subsystem: SubsystemKind,
    /// Failure description.
    pub message: String,
}

/// Errors returned by [`super::LifecycleOrchestrator`].
///
/// Activation failures carry the shutdown errors collected while unwinding
/// the partially started server, so the caller sees the original cause and
/// every secondary failure.
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    /// A caller-supplied value is missing or malformed.
    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        parameter: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The caller lacks the required role.
    #[error(transparent)]
    NotAuthorized(#[from] AuthorizationError),

    /// The configuration cannot be classified or is rejected by a subsystem.
    #[error("configuration error for server {server}: {reason}")]
    Configuration {
        /// Server being activated.
        server: ServerName,
        /// Subsystem whose configuration was rejected, when known.
        subsystem: Option<SubsystemKind>,
        /// Explanation.
        reason: String,
        /// Shutdown errors collected while rolling back.
        rollback_failures: Vec<ShutdownFailure>,
    },

    /// A subsystem raised an unexpected fault during startup.
    #[error("subsystem {subsystem} failed to start for server {server}: {message}")]
    SubsystemFailure {
        /// Server being activated.
        server: ServerName,
        /// Subsystem that failed.
        subsystem: SubsystemKind,
        /// Failure description.
        message: String,
        /// Shutdown errors collected while rolling back.
        rollback_failures: Vec<ShutdownFailure>,
    },

    /// Another lifecycle operation for the same server is in flight.
    #[error("a lifecycle operation for server {0} is already in progress")]
    LifecycleInProgress(ServerName),

    /// The server has no live instance.
    #[error("server {0} is not active")]
    NotActive(ServerName),

    /// The configuration store failed.
    #[error(transparent)]
    ConfigurationStore(#[from] ConfigurationStoreError),

    /// Registry bookkeeping failed unexpectedly.
    #[error("lifecycle bookkeeping failed for server {server}: {reason}")]
    Internal {
        /// Server being processed.
        server: String,
        /// Failure description.
        reason: String,
    },
}

impl LifecycleError {
    /// Creates an invalid-parameter error from a domain validation failure.
    #[must_use]
    pub fn invalid_parameter(parameter: &'static str, err: &LifecycleDomainError) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: err.to_string(),
        }
    }

    /// Returns the stable diagnostic code for the error.
    ///
    /// The middle segment follows HTTP status semantics: `4xx` for caller
    /// errors, `5xx` for platform failures.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "CAISSON-400-001",
            Self::Configuration { .. } => "CAISSON-400-002",
            Self::NotAuthorized(_) => "CAISSON-403-001",
            Self::NotActive(_) => "CAISSON-404-001",
            Self::ConfigurationStore(ConfigurationStoreError::NotFound(_)) => "CAISSON-404-002",
            Self::LifecycleInProgress(_) => "CAISSON-409-001",
            Self::SubsystemFailure { .. } => "CAISSON-500-001",
            Self::ConfigurationStore(_) => "CAISSON-500-002",
            Self::Internal { .. } => "CAISSON-500-003",
        }
    }

    /// Returns shutdown errors collected while rolling back, if any.
    #[must_use]
    pub fn rollback_failures(&self) -> &[ShutdownFailure] {
        match self {
            Self::Configuration {
                rollback_failures, ..
            }
            | Self::SubsystemFailure {
                rollback_failures, ..
            } => rollback_failures,
            _ => &[],
        }
    }

    pub(super) fn from_registry(server: &str, err: RegistryError) -> Self {
        match err {
            RegistryError::LifecycleInProgress(name) => Self::LifecycleInProgress(name),
            RegistryError::NotFound(name) => Self::NotActive(name),
            RegistryError::LockPoisoned(reason) => Self::Internal {
                server: server.to_owned(),
                reason,
            },
            RegistryError::Domain(domain) => Self::Internal {
                server: server.to_owned(),
                reason: domain.to_string(),
            },
        }
    }
}
