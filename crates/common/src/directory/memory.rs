use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{KeyDirectory, KeyDirectoryError, PublicKey};

/// In-memory key directory using a HashMap
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyDirectory {
    inner: Arc<RwLock<HashMap<String, PublicKey>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryKeyDirectoryError {
    #[error("memory key directory error: {0}")]
    Internal(String),
}

impl MemoryKeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyDirectory for MemoryKeyDirectory {
    type Error = MemoryKeyDirectoryError;

    async fn publish(
        &self,
        tag: &str,
        key: PublicKey,
    ) -> Result<(), KeyDirectoryError<Self::Error>> {
        let mut inner = self.inner.write().map_err(|e| {
            KeyDirectoryError::Provider(MemoryKeyDirectoryError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        if inner.contains_key(tag) {
            return Err(KeyDirectoryError::AlreadyPublished(tag.to_string()));
        }
        inner.insert(tag.to_string(), key);
        Ok(())
    }

    async fn lookup(&self, tag: &str) -> Result<Option<PublicKey>, KeyDirectoryError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            KeyDirectoryError::Provider(MemoryKeyDirectoryError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        Ok(inner.get(tag).copied())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SigningKey;
    use crate::directory::verify_tag;

    #[tokio::test]
    async fn test_publish_is_append_only() {
        let directory = MemoryKeyDirectory::new();
        let tag = verify_tag("alice");
        let key = PublicKey::Verifying(SigningKey::generate().public());

        assert!(directory.lookup(&tag).await.unwrap().is_none());
        directory.publish(&tag, key).await.unwrap();
        assert_eq!(directory.lookup(&tag).await.unwrap(), Some(key));

        let other = PublicKey::Verifying(SigningKey::generate().public());
        let result = directory.publish(&tag, other).await;
        assert!(matches!(result, Err(KeyDirectoryError::AlreadyPublished(t)) if t == tag));
        assert_eq!(directory.lookup(&tag).await.unwrap(), Some(key));
    }
}
