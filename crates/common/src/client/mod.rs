//! User-facing entry point
//!
//! A [`Client`] binds a datastore and a key directory together; users are
//! created and logged in through it and then act through a [`User`].

mod error;
mod user;

pub use error::ClientError;
pub use user::{User, UserRecord};

use crate::crypto::{DecryptionKey, KdfParams, Secret, SigningKey};
use crate::datastore::Datastore;
use crate::directory::{encrypt_tag, verify_tag, KeyDirectory, KeyDirectoryError, PublicKey};
use crate::sealed::{SealedError, SealedStore};

#[derive(Debug, Clone)]
pub struct Client<D: Datastore, K: KeyDirectory> {
    store: SealedStore<D>,
    directory: K,
}

impl<D: Datastore, K: KeyDirectory> Client<D, K> {
    pub fn new(datastore: D, directory: K, params: KdfParams) -> Self {
        Self {
            store: SealedStore::new(datastore, params),
            directory,
        }
    }

    pub fn store(&self) -> &SealedStore<D> {
        &self.store
    }

    pub fn directory(&self) -> &K {
        &self.directory
    }

    /// Register a new user and return a session for them.
    ///
    /// Generates the user's file key and both keypairs, seals them under
    /// `(password, name)` and then publishes the public halves. If an earlier
    /// call sealed the record but did not finish publishing, calling again
    /// with the same password completes the registration.
    pub async fn init_user(&self, name: &str, password: &str) -> Result<User<D, K>, ClientError> {
        if name.is_empty() {
            return Err(ClientError::InvalidUsername);
        }

        let existing = self
            .store
            .get_record::<UserRecord>(password.as_bytes(), name.as_bytes(), None)
            .await;
        let (record, resumed) = match existing {
            Ok((_, record)) if record.name == name => (record, true),
            // someone else's record, or a damaged one
            Ok(_) | Err(SealedError::Integrity(_)) => {
                return Err(ClientError::DuplicateUser(name.to_string()))
            }
            Err(SealedError::Missing(_)) => {
                if self.lookup(&verify_tag(name)).await?.is_some() {
                    return Err(ClientError::DuplicateUser(name.to_string()));
                }
                let record = UserRecord {
                    name: name.to_string(),
                    user_key: Secret::generate(),
                    signing_key: SigningKey::generate(),
                    decryption_key: DecryptionKey::generate(),
                };
                self.store
                    .put_record(password.as_bytes(), name.as_bytes(), &record, None)
                    .await?;
                (record, false)
            }
            Err(e) => return Err(e.into()),
        };

        let published_verify = self
            .ensure_published(
                name,
                &verify_tag(name),
                PublicKey::Verifying(record.signing_key.public()),
            )
            .await?;
        let published_encrypt = self
            .ensure_published(
                name,
                &encrypt_tag(name),
                PublicKey::Encryption(record.decryption_key.public()),
            )
            .await?;

        if resumed {
            if !published_verify && !published_encrypt {
                return Err(ClientError::DuplicateUser(name.to_string()));
            }
            tracing::info!("finished registering user {}", name);
        } else {
            tracing::info!("created user {}", name);
        }
        Ok(User::new(record, self.store.clone(), self.directory.clone()))
    }

    /// Log in as an existing user.
    ///
    /// A wrong password, a tampered record and an unknown name all fail
    /// the same way.
    pub async fn get_user(&self, name: &str, password: &str) -> Result<User<D, K>, ClientError> {
        let result = self
            .store
            .get_record::<UserRecord>(password.as_bytes(), name.as_bytes(), None)
            .await;

        let record = match result {
            Ok((_, record)) if record.name == name => record,
            Ok(_) | Err(SealedError::Missing(_)) | Err(SealedError::Integrity(_)) => {
                tracing::debug!("authentication failed for {}", name);
                return Err(ClientError::AuthenticationFailure);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("user {} logged in", name);
        Ok(User::new(record, self.store.clone(), self.directory.clone()))
    }

    /// Publish `key` under `tag` unless it is already there. Returns whether
    /// anything was published; a different key under the tag means the name
    /// belongs to someone else.
    async fn ensure_published(
        &self,
        name: &str,
        tag: &str,
        key: PublicKey,
    ) -> Result<bool, ClientError> {
        match self.lookup(tag).await? {
            Some(published) if published == key => return Ok(false),
            Some(_) => return Err(ClientError::DuplicateUser(name.to_string())),
            None => {}
        }
        match self.directory.publish(tag, key).await {
            Ok(()) => Ok(true),
            Err(KeyDirectoryError::AlreadyPublished(_)) => {
                Err(ClientError::DuplicateUser(name.to_string()))
            }
            Err(e) => Err(ClientError::KeyDirectory(e.to_string())),
        }
    }

    async fn lookup(&self, tag: &str) -> Result<Option<PublicKey>, ClientError> {
        self.directory
            .lookup(tag)
            .await
            .map_err(|e| ClientError::KeyDirectory(e.to_string()))
    }
}
