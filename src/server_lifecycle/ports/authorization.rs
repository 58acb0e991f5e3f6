//! Authorization port guarding lifecycle operations.

use crate::server_lifecycle::domain::{ServerName, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for authorization checks.
pub type AuthorizationResult<T> = Result<T, AuthorizationError>;

/// Right a caller needs for an operation on a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerRole {
    /// Start and stop servers.
    Operator,
    /// Change or delete stored configuration.
    Administrator,
    /// Read status and active configuration.
    Investigator,
}

impl ServerRole {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Administrator => "administrator",
            Self::Investigator => "investigator",
        }
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Trust-boundary checks consulted before reading or mutating instances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServerAuthorization: Send + Sync {
    /// Checks that `user` may start and stop `server`.
    async fn validate_operator(&self, user: &UserId, server: &ServerName)
    -> AuthorizationResult<()>;

    /// Checks that `user` may change or delete `server`'s configuration.
    async fn validate_administrator(
        &self,
        user: &UserId,
        server: &ServerName,
    ) -> AuthorizationResult<()>;

    /// Checks that `user` may read `server`'s status.
    async fn validate_investigator(
        &self,
        user: &UserId,
        server: &ServerName,
    ) -> AuthorizationResult<()>;
}

/// Errors returned by authorization implementations.
#[derive(Debug, Clone, Error)]
pub enum AuthorizationError {
    /// The user lacks the role.
    #[error("user {user} is not {role} of server {server}")]
    Denied {
        /// Calling user.
        user: UserId,
        /// Target server.
        server: ServerName,
        /// Missing role.
        role: ServerRole,
    },

    /// The authorization backend could not answer.
    #[error("authorization unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuthorizationError {
    /// Wraps a backend failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
