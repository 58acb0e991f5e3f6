//! Platform settings loaded from the process environment.
//!
//! | Variable | Default | Meaning |
//! | --- | --- | --- |
//! | `CAISSON_CONFIG_DIR` | `.caisson/servers` | Directory of stored server documents |
//! | `CAISSON_PLATFORM_USER` | `platform` | Identity used for start-up activation |
//! | `CAISSON_STARTUP_SERVERS` | empty | Comma-separated servers to activate at start-up |
//! | `CAISSON_LOG` | `caisson=info` | `tracing` filter directive |

use crate::server_lifecycle::domain::{ServerName, UserId};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Environment variable naming the configuration document directory.
pub const CONFIG_DIR_VAR: &str = "CAISSON_CONFIG_DIR";
/// Environment variable naming the platform identity.
pub const PLATFORM_USER_VAR: &str = "CAISSON_PLATFORM_USER";
/// Environment variable listing start-up servers.
pub const STARTUP_SERVERS_VAR: &str = "CAISSON_STARTUP_SERVERS";
/// Environment variable holding the log filter.
pub const LOG_VAR: &str = "CAISSON_LOG";

const DEFAULT_CONFIG_DIR: &str = ".caisson/servers";
const DEFAULT_PLATFORM_USER: &str = "platform";
const DEFAULT_LOG_FILTER: &str = "caisson=info";

/// Errors raised while reading platform settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// A variable is set to a value that cannot be used.
    #[error("{variable} is invalid: {reason}")]
    InvalidValue {
        /// Offending variable.
        variable: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Settings the platform process runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSettings {
    config_dir: Utf8PathBuf,
    platform_user: UserId,
    startup_servers: Vec<ServerName>,
    log_filter: String,
}

impl PlatformSettings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValue`] when a variable is set to an
    /// unusable value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through an arbitrary lookup function.
    ///
    /// Unset and blank variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValue`] when the platform user or a
    /// start-up server name fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let config_dir = read(CONFIG_DIR_VAR)
            .map_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_DIR), Utf8PathBuf::from);
        let platform_user = UserId::new(
            read(PLATFORM_USER_VAR).unwrap_or_else(|| DEFAULT_PLATFORM_USER.to_owned()),
        )
        .map_err(|err| SettingsError::InvalidValue {
            variable: PLATFORM_USER_VAR,
            reason: err.to_string(),
        })?;
        let startup_servers = read(STARTUP_SERVERS_VAR)
            .map(|value| parse_server_list(&value))
            .transpose()?
            .unwrap_or_default();
        let log_filter = read(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());

        Ok(Self {
            config_dir,
            platform_user,
            startup_servers,
            log_filter,
        })
    }

    /// Returns the configuration document directory.
    #[must_use]
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Returns the platform identity.
    #[must_use]
    pub const fn platform_user(&self) -> &UserId {
        &self.platform_user
    }

    /// Returns the servers to activate at start-up, in order.
    #[must_use]
    pub fn startup_servers(&self) -> &[ServerName] {
        &self.startup_servers
    }

    /// Returns the `tracing` filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }
}

fn parse_server_list(value: &str) -> Result<Vec<ServerName>, SettingsError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            ServerName::new(entry).map_err(|err| SettingsError::InvalidValue {
                variable: STARTUP_SERVERS_VAR,
                reason: err.to_string(),
            })
        })
        .collect()
}
