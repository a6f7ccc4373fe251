//! Object Storage Backend
//!
//! Untrusted key-value storage for sharelock, over pluggable object storage
//! (S3/MinIO/local filesystem/memory).
//!
//! Two namespaces are kept apart:
//!
//! - `records/<key>`: sealed records (encrypted, MAC'd or signed by the client)
//! - `keys/<tag>`: public key directory entries
//!
//! # Example
//!
//! ```rust,no_run
//! use sharelock_object_store::{ObjectStore, ObjectStoreConfig};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), sharelock_object_store::ObjectStoreError> {
//! let store = ObjectStore::new(ObjectStoreConfig::Local {
//!     path: PathBuf::from("/tmp/sharelock"),
//! })
//! .await?;
//! store.put_record("some-key", bytes::Bytes::from_static(b"sealed")).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod storage;

pub use error::{ObjectStoreError, Result};
pub use storage::{ObjectStore, ObjectStoreConfig};
