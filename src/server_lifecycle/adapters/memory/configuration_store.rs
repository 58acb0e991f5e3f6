//! In-memory configuration store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::server_lifecycle::{
    domain::{ServerConfiguration, ServerName},
    ports::{ConfigurationStore, ConfigurationStoreError, ConfigurationStoreResult},
};

/// Thread-safe in-memory configuration store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigurationStore {
    documents: Arc<RwLock<HashMap<ServerName, ServerConfiguration>>>,
}

impl InMemoryConfigurationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names with a stored document, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationStoreError::Persistence`] when the lock is
    /// poisoned.
    pub fn stored_server_names(&self) -> ConfigurationStoreResult<Vec<ServerName>> {
        let documents = self.documents.read().map_err(poisoned)?;
        let mut names: Vec<_> = documents.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

fn poisoned<E: std::fmt::Display>(err: E) -> ConfigurationStoreError {
    ConfigurationStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ConfigurationStore for InMemoryConfigurationStore {
    async fn load(&self, server: &ServerName) -> ConfigurationStoreResult<ServerConfiguration> {
        let documents = self.documents.read().map_err(poisoned)?;
        documents
            .get(server)
            .cloned()
            .ok_or_else(|| ConfigurationStoreError::NotFound(server.clone()))
    }

    async fn save(
        &self,
        server: &ServerName,
        config: &ServerConfiguration,
    ) -> ConfigurationStoreResult<()> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        documents.insert(server.clone(), config.clone());
        Ok(())
    }

    async fn delete(&self, server: &ServerName) -> ConfigurationStoreResult<()> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        documents.remove(server);
        Ok(())
    }
}
