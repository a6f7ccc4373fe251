use std::fs;
use std::path::{Path, PathBuf};

use object_store::{ObjectStore, ObjectStoreConfig, ObjectStoreError};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::crypto::{KdfError, KdfParams};
use crate::datastore::ObjectDatastore;
use crate::directory::ObjectKeyDirectory;

pub const CONFIG_FILE_NAME: &str = "sharelock.toml";

/// Everything needed to connect a [`Client`] to durable storage.
///
/// ```toml
/// [kdf]
/// mem_cost_kib = 65536
/// time_cost = 3
/// parallelism = 4
///
/// [storage]
/// type = "local"
/// path = "/var/lib/sharelock"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub kdf: KdfParams,
    pub storage: ObjectStoreConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing config file: {0}")]
    MissingFile(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("invalid kdf parameters: {0}")]
    Kdf(#[from] KdfError),

    #[error("storage error: {0}")]
    Storage(#[from] ObjectStoreError),
}

impl ClientConfig {
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(toml)?;
        config.kdf.validate()?;
        Ok(config)
    }

    /// Load from a file, or from `sharelock.toml` inside it if `path` is a
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        if !path.exists() {
            return Err(ConfigError::MissingFile(path));
        }

        let config_toml = fs::read_to_string(&path)?;
        Self::from_toml_str(&config_toml)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let config_toml = toml::to_string_pretty(self)?;
        fs::write(path, config_toml)?;
        Ok(())
    }

    /// Build the configured object store and a client over it.
    ///
    /// Records and directory entries share one store under separate prefixes.
    pub async fn connect(&self) -> Result<Client<ObjectDatastore, ObjectKeyDirectory>, ConfigError> {
        self.kdf.validate()?;
        let store = ObjectStore::new(self.storage.clone()).await?;
        tracing::debug!("connected client with kdf params {:?}", self.kdf);
        Ok(Client::new(
            ObjectDatastore::new(store.clone()),
            ObjectKeyDirectory::new(store),
            self.kdf,
        ))
    }
}
