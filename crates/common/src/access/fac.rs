use serde::{Deserialize, Serialize};

use super::{chunk, AccessError};
use crate::codec::Encoded;
use crate::crypto::{KeyTriple, Secret};
use crate::datastore::Datastore;
use crate::location::Location;
use crate::sealed::{SealedError, SealedStore};

/// File Access Control record: the key and endpoints of one chunk chain.
///
/// Every OAC node of a sharing tree points at the same FAC, so writes made
/// through any node are seen by all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAccess {
    pub chunk_key: Secret,
    pub head: Location,
    pub tail: Location,
}

impl Encoded for FileAccess {}

impl FileAccess {
    /// A new empty chain under a fresh chunk key.
    pub fn empty() -> Self {
        let head = Location::random();
        Self {
            chunk_key: Secret::generate(),
            head,
            tail: head,
        }
    }

    /// Create a FAC holding `content` under a fresh random key.
    ///
    /// Returns the FAC's location (derived from the key) and the key.
    pub async fn create<D: Datastore>(
        store: &SealedStore<D>,
        content: &[u8],
    ) -> Result<(Location, Secret), AccessError> {
        let key = Secret::generate();
        let keys = store.derive_location_and_keys(&key).await?;

        let mut access = Self::empty();
        access.append(store, content).await?;
        access.persist(store, &keys, keys.location()).await?;

        tracing::debug!("created fac at {}", keys.location());
        Ok((keys.location(), key))
    }

    pub async fn load<D: Datastore>(
        store: &SealedStore<D>,
        location: Location,
        key: &Secret,
    ) -> Result<(KeyTriple, Self), AccessError> {
        let keys = store.derive_location_and_keys(key).await?;
        let access = match store.open_record::<Self>(&keys, location).await {
            Ok(access) => access,
            // an access node vouches for this FAC, so its absence is tampering
            Err(SealedError::Missing(location)) => {
                tracing::warn!("fac missing at {}", location);
                return Err(SealedError::Integrity(location).into());
            }
            Err(e) => return Err(e.into()),
        };
        Ok((keys, access))
    }

    pub async fn persist<D: Datastore>(
        &self,
        store: &SealedStore<D>,
        keys: &KeyTriple,
        location: Location,
    ) -> Result<(), AccessError> {
        store.seal_record(keys, location, self).await?;
        Ok(())
    }

    /// Append to the chain, moving the tail. The caller persists the FAC.
    pub async fn append<D: Datastore>(
        &mut self,
        store: &SealedStore<D>,
        content: &[u8],
    ) -> Result<(), AccessError> {
        if content.is_empty() {
            return Ok(());
        }
        let keys = store.derive_location_and_keys(&self.chunk_key).await?;
        self.tail = chunk::append(store, &keys, self.tail, content).await?;
        Ok(())
    }

    pub async fn read_all<D: Datastore>(&self, store: &SealedStore<D>) -> Result<Vec<u8>, AccessError> {
        if self.head == self.tail {
            return Ok(Vec::new());
        }
        let keys = store.derive_location_and_keys(&self.chunk_key).await?;
        chunk::read_all(store, &keys, self.head, self.tail).await
    }

    /// Load, append `content`, persist.
    pub async fn append_content<D: Datastore>(
        store: &SealedStore<D>,
        location: Location,
        key: &Secret,
        content: &[u8],
    ) -> Result<(), AccessError> {
        let (keys, mut access) = Self::load(store, location, key).await?;
        access.append(store, content).await?;
        access.persist(store, &keys, location).await
    }

    pub async fn read_content<D: Datastore>(
        store: &SealedStore<D>,
        location: Location,
        key: &Secret,
    ) -> Result<Vec<u8>, AccessError> {
        let (_, access) = Self::load(store, location, key).await?;
        access.read_all(store).await
    }

    /// Swap the chain for a fresh one holding only `content`.
    ///
    /// The FAC stays at the same location under the same key, so every node
    /// pointing at it sees the new content. The old chain becomes unreachable.
    pub async fn replace_content<D: Datastore>(
        store: &SealedStore<D>,
        location: Location,
        key: &Secret,
        content: &[u8],
    ) -> Result<(), AccessError> {
        let (keys, _) = Self::load(store, location, key).await?;
        let mut access = Self::empty();
        access.append(store, content).await?;
        access.persist(store, &keys, location).await
    }
}
