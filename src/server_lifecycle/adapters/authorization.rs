//! Authorization adapters.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::server_lifecycle::{
    domain::{ServerName, UserId},
    ports::{AuthorizationError, AuthorizationResult, ServerAuthorization, ServerRole},
};

/// Authorization that admits every user for every server.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllAuthorization;

#[async_trait]
impl ServerAuthorization for AllowAllAuthorization {
    async fn validate_operator(
        &self,
        _user: &UserId,
        _server: &ServerName,
    ) -> AuthorizationResult<()> {
        Ok(())
    }

    async fn validate_administrator(
        &self,
        _user: &UserId,
        _server: &ServerName,
    ) -> AuthorizationResult<()> {
        Ok(())
    }

    async fn validate_investigator(
        &self,
        _user: &UserId,
        _server: &ServerName,
    ) -> AuthorizationResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Grant {
    role: ServerRole,
    server: Option<ServerName>,
}

impl Grant {
    fn covers(&self, role: ServerRole, server: &ServerName) -> bool {
        let role_matches = self.role == role || self.role == ServerRole::Administrator;
        let server_matches = self.server.as_ref().is_none_or(|scoped| scoped == server);
        role_matches && server_matches
    }
}

/// Static table of per-user role grants.
///
/// An administrator grant satisfies every check for the servers it covers.
#[derive(Debug, Clone, Default)]
pub struct RoleTableAuthorization {
    grants: HashMap<UserId, Vec<Grant>>,
}

impl RoleTableAuthorization {
    /// Creates a table with no grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `role` on every server.
    #[must_use]
    pub fn grant(mut self, user: UserId, role: ServerRole) -> Self {
        self.grants
            .entry(user)
            .or_default()
            .push(Grant { role, server: None });
        self
    }

    /// Grants `role` on one server.
    #[must_use]
    pub fn grant_for_server(mut self, user: UserId, role: ServerRole, server: ServerName) -> Self {
        self.grants.entry(user).or_default().push(Grant {
            role,
            server: Some(server),
        });
        self
    }

    fn check(&self, user: &UserId, server: &ServerName, role: ServerRole) -> AuthorizationResult<()> {
        let granted = self
            .grants
            .get(user)
            .is_some_and(|grants| grants.iter().any(|grant| grant.covers(role, server)));
        if granted {
            Ok(())
        } else {
            Err(AuthorizationError::Denied {
                user: user.clone(),
                server: server.clone(),
                role,
            })
        }
    }
}

#[async_trait]
impl ServerAuthorization for RoleTableAuthorization {
    async fn validate_operator(
        &self,
        user: &UserId,
        server: &ServerName,
    ) -> AuthorizationResult<()> {
        self.check(user, server, ServerRole::Operator)
    }

    async fn validate_administrator(
        &self,
        user: &UserId,
        server: &ServerName,
    ) -> AuthorizationResult<()> {
        self.check(user, server, ServerRole::Administrator)
    }

    async fn validate_investigator(
        &self,
        user: &UserId,
        server: &ServerName,
    ) -> AuthorizationResult<()> {
        self.check(user, server, ServerRole::Investigator)
    }
}
