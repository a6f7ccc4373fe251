use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, ObjectStoreError};

use super::{Datastore, DatastoreError};
use crate::location::Location;

/// Datastore over a durable object store (local filesystem, S3, memory).
///
/// Records are keyed by the hyphenated form of their location.
#[derive(Debug, Clone)]
pub struct ObjectDatastore {
    store: ObjectStore,
}

impl ObjectDatastore {
    pub fn new(store: ObjectStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }
}

#[async_trait]
impl Datastore for ObjectDatastore {
    type Error = ObjectStoreError;

    async fn put(&self, location: Location, data: Bytes) -> Result<(), DatastoreError<Self::Error>> {
        self.store.put_record(&location.to_string(), data).await?;
        Ok(())
    }

    async fn get(&self, location: Location) -> Result<Option<Bytes>, DatastoreError<Self::Error>> {
        Ok(self.store.get_record(&location.to_string()).await?)
    }

    async fn delete(&self, location: Location) -> Result<(), DatastoreError<Self::Error>> {
        self.store.delete_record(&location.to_string()).await?;
        Ok(())
    }

    async fn exists(&self, location: Location) -> Result<bool, DatastoreError<Self::Error>> {
        Ok(self.store.has_record(&location.to_string()).await?)
    }
}
