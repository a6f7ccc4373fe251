use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, ObjectStoreError};

use super::{KeyDirectory, KeyDirectoryError, PublicKey};
use crate::codec::{CodecError, Encoded};

#[derive(thiserror::Error, Debug)]
pub enum ObjectKeyDirectoryError {
    #[error("object store error: {0}")]
    Store(#[from] ObjectStoreError),
    #[error("malformed directory entry: {0}")]
    Codec(#[from] CodecError),
}

/// Key directory kept in the `keys/` namespace of an object store.
///
/// Tags are hex-encoded into the object path so that user names never need
/// escaping. The append-only check is read-then-write; the backend offers
/// nothing stronger.
#[derive(Debug, Clone)]
pub struct ObjectKeyDirectory {
    store: ObjectStore,
}

impl ObjectKeyDirectory {
    pub fn new(store: ObjectStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl KeyDirectory for ObjectKeyDirectory {
    type Error = ObjectKeyDirectoryError;

    async fn publish(
        &self,
        tag: &str,
        key: PublicKey,
    ) -> Result<(), KeyDirectoryError<Self::Error>> {
        let path = hex::encode(tag);
        if self
            .store
            .get_key_entry(&path)
            .await
            .map_err(ObjectKeyDirectoryError::from)?
            .is_some()
        {
            return Err(KeyDirectoryError::AlreadyPublished(tag.to_string()));
        }

        let data = key.encode().map_err(ObjectKeyDirectoryError::from)?;
        self.store
            .put_key_entry(&path, Bytes::from(data))
            .await
            .map_err(ObjectKeyDirectoryError::from)?;
        Ok(())
    }

    async fn lookup(&self, tag: &str) -> Result<Option<PublicKey>, KeyDirectoryError<Self::Error>> {
        let entry = self
            .store
            .get_key_entry(&hex::encode(tag))
            .await
            .map_err(ObjectKeyDirectoryError::from)?;

        match entry {
            Some(data) => Ok(Some(
                PublicKey::decode(&data).map_err(ObjectKeyDirectoryError::from)?,
            )),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::DecryptionKey;
    use crate::directory::encrypt_tag;

    #[tokio::test]
    async fn test_publish_and_lookup() {
        let directory = ObjectKeyDirectory::new(ObjectStore::memory());
        let tag = encrypt_tag("bob/with slash");
        let key = PublicKey::Encryption(DecryptionKey::generate().public());

        directory.publish(&tag, key).await.unwrap();
        assert_eq!(directory.lookup(&tag).await.unwrap(), Some(key));
        assert!(directory.lookup(&encrypt_tag("bob")).await.unwrap().is_none());
        assert!(matches!(
            directory.publish(&tag, key).await,
            Err(KeyDirectoryError::AlreadyPublished(_))
        ));
    }
}
