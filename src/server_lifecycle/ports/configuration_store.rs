//! Configuration store port for stored server configuration documents.

use crate::server_lifecycle::domain::{ServerConfiguration, ServerName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for configuration store operations.
pub type ConfigurationStoreResult<T> = Result<T, ConfigurationStoreError>;

/// Persistence contract for server configuration documents.
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Loads the stored document for a server.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationStoreError::NotFound`] when nothing is stored
    /// under the name.
    async fn load(&self, server: &ServerName) -> ConfigurationStoreResult<ServerConfiguration>;

    /// Stores a document, replacing any previous one.
    async fn save(
        &self,
        server: &ServerName,
        config: &ServerConfiguration,
    ) -> ConfigurationStoreResult<()>;

    /// Deletes the stored document. Deleting a missing document succeeds.
    async fn delete(&self, server: &ServerName) -> ConfigurationStoreResult<()>;
}

/// Errors returned by configuration store implementations.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationStoreError {
    /// No document is stored for the server.
    #[error("no configuration stored for server {0}")]
    NotFound(ServerName),

    /// The stored document could not be decoded.
    #[error("stored configuration for server {server} is invalid: {cause}")]
    InvalidDocument {
        /// Server whose document failed to decode.
        server: ServerName,
        /// Decoding failure.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Persistence-layer failure.
    #[error("configuration store error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConfigurationStoreError {
    /// Wraps a decoding failure for the given server.
    pub fn invalid_document(
        server: ServerName,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidDocument {
            server,
            cause: Arc::new(err),
        }
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
