use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codec::Encoded;
use crate::crypto::{EncryptionKey, VerifyingKey};

mod memory;
mod object;

pub use memory::{MemoryKeyDirectory, MemoryKeyDirectoryError};
pub use object::{ObjectKeyDirectory, ObjectKeyDirectoryError};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyDirectoryError<T> {
    #[error("unhandled key directory provider error: {0}")]
    Provider(#[from] T),
    /// Entries are never replaced once published
    #[error("key already published under tag {0}")]
    AlreadyPublished(String),
}

/// A public key as published to the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicKey {
    Verifying(VerifyingKey),
    Encryption(EncryptionKey),
}

impl Encoded for PublicKey {}

impl PublicKey {
    pub fn as_verifying(&self) -> Option<&VerifyingKey> {
        match self {
            PublicKey::Verifying(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_encryption(&self) -> Option<&EncryptionKey> {
        match self {
            PublicKey::Encryption(key) => Some(key),
            _ => None,
        }
    }
}

/// Tag under which `name`'s signature verification key is published
pub fn verify_tag(name: &str) -> String {
    format!("{}/verify", name)
}

/// Tag under which `name`'s public encryption key is published
pub fn encrypt_tag(name: &str) -> String {
    format!("{}/encrypt", name)
}

/// Globally readable, append-only registry of users' public keys.
#[async_trait]
pub trait KeyDirectory: Send + Sync + std::fmt::Debug + Clone + 'static {
    type Error: Display + Debug + Send;

    /// Publish a key under `tag`
    ///
    /// Should fail with `KeyDirectoryError::AlreadyPublished` if the tag
    /// is taken.
    async fn publish(&self, tag: &str, key: PublicKey)
        -> Result<(), KeyDirectoryError<Self::Error>>;

    /// Look up the key published under `tag`
    async fn lookup(&self, tag: &str) -> Result<Option<PublicKey>, KeyDirectoryError<Self::Error>>;
}
