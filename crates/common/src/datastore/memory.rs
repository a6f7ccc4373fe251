use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{Datastore, DatastoreError};
use crate::location::Location;

/// In-memory datastore backed by a HashMap
///
/// Clones share the same map, so a test can keep a handle and play the
/// adversary while a client uses another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatastore {
    inner: Arc<RwLock<HashMap<Location, Bytes>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryDatastoreError {
    #[error("memory datastore error: {0}")]
    Internal(String),
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<
        std::sync::RwLockReadGuard<'_, HashMap<Location, Bytes>>,
        DatastoreError<MemoryDatastoreError>,
    > {
        self.inner.read().map_err(|e| {
            DatastoreError::Provider(MemoryDatastoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })
    }

    fn write(
        &self,
    ) -> Result<
        std::sync::RwLockWriteGuard<'_, HashMap<Location, Bytes>>,
        DatastoreError<MemoryDatastoreError>,
    > {
        self.inner.write().map_err(|e| {
            DatastoreError::Provider(MemoryDatastoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })
    }

    /// Every location currently holding an entry
    pub fn locations(&self) -> Vec<Location> {
        self.inner
            .read()
            .map(|map| map.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an entry directly, bypassing the trait
    pub fn raw_get(&self, location: &Location) -> Option<Bytes> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(location).cloned())
    }

    /// Overwrite an entry directly, bypassing the trait
    pub fn raw_put(&self, location: Location, data: impl Into<Bytes>) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(location, data.into());
        }
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    type Error = MemoryDatastoreError;

    async fn put(&self, location: Location, data: Bytes) -> Result<(), DatastoreError<Self::Error>> {
        self.write()?.insert(location, data);
        Ok(())
    }

    async fn get(&self, location: Location) -> Result<Option<Bytes>, DatastoreError<Self::Error>> {
        Ok(self.read()?.get(&location).cloned())
    }

    async fn delete(&self, location: Location) -> Result<(), DatastoreError<Self::Error>> {
        self.write()?.remove(&location);
        Ok(())
    }

    async fn exists(&self, location: Location) -> Result<bool, DatastoreError<Self::Error>> {
        Ok(self.read()?.contains_key(&location))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryDatastore::new();
        let location = Location::random();

        assert!(store.get(location).await.unwrap().is_none());
        assert!(!store.exists(location).await.unwrap());

        store.put(location, Bytes::from("one")).await.unwrap();
        store.put(location, Bytes::from("two")).await.unwrap();
        assert_eq!(store.get(location).await.unwrap().unwrap(), Bytes::from("two"));
        assert_eq!(store.len(), 1);

        store.delete(location).await.unwrap();
        store.delete(location).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryDatastore::new();
        let adversary = store.clone();
        let location = Location::random();

        store.put(location, Bytes::from("sealed")).await.unwrap();
        assert_eq!(adversary.locations(), vec![location]);

        adversary.raw_put(location, b"forged".to_vec());
        assert_eq!(
            store.get(location).await.unwrap().unwrap(),
            Bytes::from("forged")
        );
        assert_eq!(store.raw_get(&location).unwrap(), Bytes::from("forged"));
    }
}
