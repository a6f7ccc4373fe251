//! Object storage backend abstraction (S3/MinIO/local filesystem/memory).

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore as RawObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{ObjectStoreError, Result};

/// Prefix for sealed records
const RECORDS_PREFIX: &str = "records";
/// Prefix for public key directory entries
const KEYS_PREFIX: &str = "keys";

/// Configuration for the object storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// Untrusted key-value storage for sealed records and directory entries.
///
/// Nothing in here is authenticated: every byte handed back may have been
/// read, rewritten or removed by whoever operates the backend. Callers are
/// expected to verify what they get.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    inner: Arc<dyn RawObjectStore>,
}

impl ObjectStore {
    /// Create a new storage backend from configuration.
    pub async fn new(config: ObjectStoreConfig) -> Result<Self> {
        let inner: Arc<dyn RawObjectStore> = match &config {
            ObjectStoreConfig::Memory => Arc::new(InMemory::new()),

            ObjectStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| ObjectStoreError::InvalidConfig(e.to_string()))?,
                )
            }

            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"));

                let store: Arc<dyn RawObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| ObjectStoreError::InvalidConfig(e.to_string()))?,
                );

                // Fail fast if the bucket doesn't exist
                {
                    use futures::TryStreamExt;
                    let prefix = ObjectPath::from("");
                    let mut stream = store.list(Some(&prefix));
                    match stream.try_next().await {
                        Ok(_) => {}
                        Err(object_store::Error::NotFound { .. }) => {
                            return Err(ObjectStoreError::BucketNotFound(bucket.clone()));
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            if msg.contains("NoSuchBucket")
                                || msg.contains("bucket") && msg.contains("not")
                            {
                                return Err(ObjectStoreError::BucketNotFound(bucket.clone()));
                            }
                            return Err(e.into());
                        }
                    }
                }

                store
            }
        };

        tracing::debug!("object store ready: {:?}", kind(&config));
        Ok(Self { inner })
    }

    /// Create an in-memory storage backend.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    fn record_path(key: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", RECORDS_PREFIX, key))
    }

    fn key_path(tag: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", KEYS_PREFIX, tag))
    }

    /// Put a record, overwriting whatever was there.
    pub async fn put_record(&self, key: &str, data: Bytes) -> Result<()> {
        self.put(&Self::record_path(key), data).await
    }

    /// Get a record, `None` if absent.
    pub async fn get_record(&self, key: &str) -> Result<Option<Bytes>> {
        self.get(&Self::record_path(key)).await
    }

    /// Delete a record. Deleting a missing record succeeds.
    pub async fn delete_record(&self, key: &str) -> Result<()> {
        self.delete(&Self::record_path(key)).await
    }

    /// Check if a record exists.
    pub async fn has_record(&self, key: &str) -> Result<bool> {
        let path = Self::record_path(key);
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List the keys of every stored record.
    pub async fn list_records(&self) -> Result<Vec<String>> {
        use futures::TryStreamExt;

        let prefix = ObjectPath::from(format!("{}/", RECORDS_PREFIX));
        let stream = self.inner.list(Some(&prefix));

        let items: Vec<_> = stream.try_collect().await?;
        let strip = format!("{}/", RECORDS_PREFIX);

        Ok(items
            .into_iter()
            .filter_map(|meta| {
                let path = meta.location.as_ref();
                path.strip_prefix(strip.as_str()).map(|s| s.to_string())
            })
            .collect())
    }

    /// Put a directory entry.
    pub async fn put_key_entry(&self, tag: &str, data: Bytes) -> Result<()> {
        self.put(&Self::key_path(tag), data).await
    }

    /// Get a directory entry, `None` if absent.
    pub async fn get_key_entry(&self, tag: &str) -> Result<Option<Bytes>> {
        self.get(&Self::key_path(tag)).await
    }

    async fn put(&self, path: &ObjectPath, data: Bytes) -> Result<()> {
        self.inner.put(path, data.into()).await?;
        Ok(())
    }

    async fn get(&self, path: &ObjectPath) -> Result<Option<Bytes>> {
        match self.inner.get(path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &ObjectPath) -> Result<()> {
        // Ignore NotFound errors - the entry may already be gone
        match self.inner.delete(path).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn kind(config: &ObjectStoreConfig) -> &'static str {
    match config {
        ObjectStoreConfig::Memory => "memory",
        ObjectStoreConfig::Local { .. } => "local",
        ObjectStoreConfig::S3 { .. } => "s3",
    }
}
