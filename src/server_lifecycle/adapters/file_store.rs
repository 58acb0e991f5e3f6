//! Filesystem-backed configuration store.
//!
//! Each server's document lives in `<server>.json` under the store root.
//! Writes land in a staging file first and are renamed into place, so a
//! reader never sees a half-written document.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io;

use crate::server_lifecycle::{
    domain::{ServerConfiguration, ServerName},
    ports::{ConfigurationStore, ConfigurationStoreError, ConfigurationStoreResult},
};

/// Configuration store keeping one JSON document per server in a directory.
#[derive(Debug, Clone)]
pub struct FileConfigurationStore {
    root: Utf8PathBuf,
}

impl FileConfigurationStore {
    /// Creates a store rooted at `root`. The directory is created on the
    /// first save.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

fn document_name(server: &ServerName) -> String {
    format!("{server}.json")
}

/// Opens the store root, returning `None` when it does not exist yet.
fn open_root(root: &Utf8Path) -> ConfigurationStoreResult<Option<Dir>> {
    match Dir::open_ambient_dir(root, ambient_authority()) {
        Ok(dir) => Ok(Some(dir)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ConfigurationStoreError::persistence(err)),
    }
}

/// Runs blocking filesystem work off the async executor.
async fn run_blocking<F, T>(f: F) -> ConfigurationStoreResult<T>
where
    F: FnOnce() -> ConfigurationStoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|err| {
        ConfigurationStoreError::persistence(io::Error::other(format!("task join error: {err}")))
    })?
}

#[async_trait]
impl ConfigurationStore for FileConfigurationStore {
    async fn load(&self, server: &ServerName) -> ConfigurationStoreResult<ServerConfiguration> {
        let root = self.root.clone();
        let name = server.clone();
        run_blocking(move || {
            let Some(dir) = open_root(&root)? else {
                return Err(ConfigurationStoreError::NotFound(name));
            };
            let contents = match dir.read_to_string(document_name(&name)) {
                Ok(contents) => contents,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return Err(ConfigurationStoreError::NotFound(name));
                }
                Err(err) => return Err(ConfigurationStoreError::persistence(err)),
            };
            serde_json::from_str(&contents)
                .map_err(|err| ConfigurationStoreError::invalid_document(name, err))
        })
        .await
    }

    async fn save(
        &self,
        server: &ServerName,
        config: &ServerConfiguration,
    ) -> ConfigurationStoreResult<()> {
        let contents =
            serde_json::to_string_pretty(config).map_err(ConfigurationStoreError::persistence)?;
        let root = self.root.clone();
        let target = document_name(server);
        run_blocking(move || {
            Dir::create_ambient_dir_all(&root, ambient_authority())
                .map_err(ConfigurationStoreError::persistence)?;
            let dir = Dir::open_ambient_dir(&root, ambient_authority())
                .map_err(ConfigurationStoreError::persistence)?;
            let staging = format!("{target}.tmp");
            dir.write(&staging, contents)
                .map_err(ConfigurationStoreError::persistence)?;
            dir.rename(&staging, &dir, &target)
                .map_err(ConfigurationStoreError::persistence)
        })
        .await
    }

    async fn delete(&self, server: &ServerName) -> ConfigurationStoreResult<()> {
        let root = self.root.clone();
        let target = document_name(server);
        run_blocking(move || {
            let Some(dir) = open_root(&root)? else {
                return Ok(());
            };
            match dir.remove_file(&target) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(ConfigurationStoreError::persistence(err)),
            }
        })
        .await
    }
}
