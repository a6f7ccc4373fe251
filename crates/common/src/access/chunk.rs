use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::AccessError;
use crate::codec::Encoded;
use crate::crypto::KeyTriple;
use crate::datastore::Datastore;
use crate::location::Location;
use crate::sealed::{SealedError, SealedStore};

/// One link of a file's content chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: Vec<u8>,
    /// Where the following chunk will be written. Once this equals the
    /// chain's tail, the chain ends here.
    pub next: Location,
}

impl Encoded for Chunk {}

/// Write `content` at the current `tail` and return the new tail.
///
/// Every chunk of a chain is sealed under the same `keys`. Overwriting an
/// existing chunk at `tail` only happens when a previous append was lost
/// before its FAC was persisted, and is harmless.
pub async fn append<D: Datastore>(
    store: &SealedStore<D>,
    keys: &KeyTriple,
    tail: Location,
    content: &[u8],
) -> Result<Location, AccessError> {
    let next = Location::random();
    let chunk = Chunk {
        content: content.to_vec(),
        next,
    };
    store.seal_record(keys, tail, &chunk).await?;
    Ok(next)
}

/// Concatenate every chunk from `head` up to (not including) `tail`.
pub async fn read_all<D: Datastore>(
    store: &SealedStore<D>,
    keys: &KeyTriple,
    head: Location,
    tail: Location,
) -> Result<Vec<u8>, AccessError> {
    let mut content = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = head;

    while cursor != tail {
        if !seen.insert(cursor) {
            tracing::warn!("chunk chain loops back to {}", cursor);
            return Err(SealedError::Integrity(cursor).into());
        }

        let chunk: Chunk = match store.open_record(keys, cursor).await {
            Ok(chunk) => chunk,
            // the FAC vouches for this chunk, so a hole is tampering
            Err(SealedError::Missing(location)) => {
                tracing::warn!("chunk missing at {}", location);
                return Err(SealedError::Integrity(location).into());
            }
            Err(e) => return Err(e.into()),
        };
        content.extend_from_slice(&chunk.content);
        cursor = chunk.next;
    }

    Ok(content)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{KdfParams, Secret};
    use crate::datastore::MemoryDatastore;

    async fn setup() -> (MemoryDatastore, SealedStore<MemoryDatastore>, KeyTriple) {
        let datastore = MemoryDatastore::new();
        let store = SealedStore::new(
            datastore.clone(),
            KdfParams {
                mem_cost_kib: 64,
                time_cost: 1,
                parallelism: 1,
            },
        );
        let keys = store
            .derive_location_and_keys(&Secret::generate())
            .await
            .unwrap();
        (datastore, store, keys)
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let (datastore, store, keys) = setup().await;
        let head = Location::random();

        assert!(read_all(&store, &keys, head, head).await.unwrap().is_empty());

        let mut tail = head;
        for part in [b"ab".as_slice(), b"", b"cd", b"ef"] {
            tail = append(&store, &keys, tail, part).await.unwrap();
        }

        assert_eq!(read_all(&store, &keys, head, tail).await.unwrap(), b"abcdef");
        assert_eq!(datastore.len(), 4);
        assert!(!datastore.locations().contains(&tail));
    }

    #[tokio::test]
    async fn test_cycle_is_integrity_failure() {
        let (_, store, keys) = setup().await;
        let head = Location::random();
        let second = Location::random();

        store
            .seal_record(&keys, head, &Chunk { content: b"a".to_vec(), next: second })
            .await
            .unwrap();
        store
            .seal_record(&keys, second, &Chunk { content: b"b".to_vec(), next: head })
            .await
            .unwrap();

        let result = read_all(&store, &keys, head, Location::random()).await;
        assert!(matches!(
            result,
            Err(AccessError::Sealed(SealedError::Integrity(l))) if l == head
        ));
    }

    #[tokio::test]
    async fn test_missing_chunk_is_integrity_failure() {
        let (datastore, store, keys) = setup().await;
        let head = Location::random();
        let middle = append(&store, &keys, head, b"ab").await.unwrap();
        let tail = append(&store, &keys, middle, b"cd").await.unwrap();

        store.delete(middle).await.unwrap();
        assert_eq!(datastore.len(), 1);

        let result = read_all(&store, &keys, head, tail).await;
        assert!(matches!(
            result,
            Err(AccessError::Sealed(SealedError::Integrity(l))) if l == middle
        ));
    }
}
