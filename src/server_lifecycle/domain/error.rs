//! Error types for server lifecycle domain validation and parsing.

use super::{Classification, ServerName, SubsystemKind};
use thiserror::Error;

/// Errors returned while constructing or mutating lifecycle domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleDomainError {
    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server name contains characters outside `[A-Za-z0-9_.-]`.
    #[error(
        "server name '{0}' contains invalid characters (only alphanumerics, '_', '.' and '-' allowed)"
    )]
    InvalidServerName(String),

    /// The server name exceeds the storage limit.
    #[error("server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// The configured page size is zero.
    #[error("maximum page size must be greater than zero")]
    InvalidMaxPageSize,

    /// The configuration could not be encoded as JSON.
    #[error("configuration could not be encoded: {0}")]
    UnserializableConfiguration(String),

    /// No section of the configuration identifies a server type.
    #[error("configuration for server {server} does not describe any known server type")]
    UnclassifiableConfiguration {
        /// Server whose configuration was inspected.
        server: ServerName,
    },

    /// Sections belonging to different server types are populated together.
    #[error("configuration for server {server} mixes incompatible sections: {sections}")]
    ConflictingSections {
        /// Server whose configuration was inspected.
        server: ServerName,
        /// Comma-separated names of the conflicting sections.
        sections: String,
    },

    /// The metadata sections are present but incomplete.
    #[error("configuration for server {server} is incomplete: {reason}")]
    IncompleteConfiguration {
        /// Server whose configuration was inspected.
        server: ServerName,
        /// Explanation of the missing piece.
        reason: String,
    },

    /// The same subsystem appears twice in a startup recipe.
    #[error("subsystem {kind} is configured more than once for a {classification}")]
    DuplicateSubsystem {
        /// Repeated subsystem.
        kind: SubsystemKind,
        /// Classification whose recipe was being built.
        classification: Classification,
    },

    /// A listener step was ordered after the step that starts event delivery.
    #[error("subsystem {listener} registers listeners after event delivery was started")]
    ListenerAfterDeliveryStart {
        /// Offending listener step.
        listener: SubsystemKind,
    },

    /// A step needs the shared event source but no earlier step provides it.
    #[error("subsystem {0} needs the enterprise event source but no earlier step provides it")]
    MissingEventSource(SubsystemKind),

    /// Moving a status between two states is not allowed.
    #[error("invalid status transition for {subject}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Instance or subsystem whose status was changing.
        subject: String,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// A subsystem was referenced that the instance never started.
    #[error("subsystem {0} is not tracked by this instance")]
    UnknownSubsystem(SubsystemKind),
}

/// Error returned while parsing a status from its string form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown subsystem status: {0}")]
pub struct ParseSubsystemStatusError(pub String);

/// Error returned while parsing a subsystem tag from its string form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown subsystem kind: {0}")]
pub struct ParseSubsystemKindError(pub String);
