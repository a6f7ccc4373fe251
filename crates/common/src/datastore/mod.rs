use std::fmt::{Debug, Display};

use async_trait::async_trait;
use bytes::Bytes;

use crate::location::Location;

mod faulty;
mod memory;
mod object;

pub use faulty::{FaultyDatastore, FaultyDatastoreError};
pub use memory::{MemoryDatastore, MemoryDatastoreError};
pub use object::ObjectDatastore;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DatastoreError<T> {
    #[error("unhandled datastore provider error: {0}")]
    Provider(#[from] T),
}

/// The untrusted key-value store every record lives in.
///
/// No atomicity across calls, no ordering between keys, and whoever runs it
/// may read, rewrite or drop any entry. Implementations only move bytes.
#[async_trait]
pub trait Datastore: Send + Sync + std::fmt::Debug + Clone + 'static {
    type Error: Display + Debug + Send;

    /// Write `data` at `location`, replacing whatever was there
    async fn put(&self, location: Location, data: Bytes) -> Result<(), DatastoreError<Self::Error>>;

    /// Read the entry at `location`, `None` if absent
    async fn get(&self, location: Location) -> Result<Option<Bytes>, DatastoreError<Self::Error>>;

    /// Remove the entry at `location`
    ///
    /// Removing a missing entry is not an error.
    async fn delete(&self, location: Location) -> Result<(), DatastoreError<Self::Error>>;

    async fn exists(&self, location: Location) -> Result<bool, DatastoreError<Self::Error>> {
        Ok(self.get(location).await?.is_some())
    }
}
