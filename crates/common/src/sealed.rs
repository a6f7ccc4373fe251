//! Encrypt-then-MAC adapter over an untrusted [`Datastore`]
//!
//! Nothing else in the crate touches the datastore. Every write goes out as a
//! [`SealedRecord`] and every read is authenticated before it is decrypted.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Encoded};
use crate::crypto::{self, KdfError, KdfParams, KeyTriple, Secret, SecretError, SecretShare};
use crate::datastore::Datastore;
use crate::location::Location;

/// The only structure ever physically written to the datastore.
///
/// For ordinary records `tag` is a MAC over location and `ciphertext`. For invitation
/// envelopes it is the sender's signature and `wrapped_key` carries the
/// payload key for the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
    pub wrapped_key: Option<SecretShare>,
}

impl Encoded for SealedRecord {}

#[derive(Debug, thiserror::Error)]
pub enum SealedError {
    #[error("no record at {0}")]
    Missing(Location),
    #[error("integrity check failed for record at {0}")]
    Integrity(Location),
    #[error("datastore error: {0}")]
    Datastore(String),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("kdf error: {0}")]
    Kdf(#[from] KdfError),
    #[error("sealed store error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Authenticated view of a datastore.
#[derive(Debug, Clone)]
pub struct SealedStore<D: Datastore> {
    datastore: D,
    params: KdfParams,
}

impl<D: Datastore> SealedStore<D> {
    pub fn new(datastore: D, params: KdfParams) -> Self {
        Self { datastore, params }
    }

    pub fn datastore(&self) -> &D {
        &self.datastore
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Derive the key triple for `(secret, context)` on the blocking pool.
    pub async fn derive(&self, secret: &[u8], context: &[u8]) -> Result<KeyTriple, SealedError> {
        let secret = secret.to_vec();
        let context = context.to_vec();
        let params = self.params;
        let keys = tokio::task::spawn_blocking(move || crypto::derive(&secret, &context, &params))
            .await
            .map_err(|e| anyhow::anyhow!("key derivation task failed: {}", e))??;
        Ok(keys)
    }

    pub async fn derive_location_and_keys(&self, secret: &Secret) -> Result<KeyTriple, SealedError> {
        self.derive(secret.bytes(), secret.bytes()).await
    }

    /// Encrypt and MAC `plaintext` under `keys`, writing it at `location`.
    pub async fn seal(
        &self,
        keys: &KeyTriple,
        location: Location,
        plaintext: &[u8],
    ) -> Result<(), SealedError> {
        let ciphertext = keys.encryption_key().encrypt(plaintext)?;
        let tag = keys.mac(&mac_input(location, &ciphertext)).to_vec();
        self.put_envelope(
            location,
            &SealedRecord {
                ciphertext,
                tag,
                wrapped_key: None,
            },
        )
        .await
    }

    /// Fetch the record at `location`, verify its MAC, then decrypt it.
    pub async fn open(&self, keys: &KeyTriple, location: Location) -> Result<Vec<u8>, SealedError> {
        let record = self.get_envelope(location).await?;
        if !keys.verify_mac(&mac_input(location, &record.ciphertext), &record.tag) {
            tracing::warn!("mac mismatch at {}", location);
            return Err(SealedError::Integrity(location));
        }
        keys.encryption_key()
            .decrypt(&record.ciphertext)
            .map_err(|_| {
                tracing::warn!("record at {} authenticated but did not decrypt", location);
                SealedError::Integrity(location)
            })
    }

    /// Derive keys from `(secret, context)` and seal `plaintext`.
    ///
    /// The record lands at `location` if given, otherwise at the location
    /// derived from `context`. Returns where it was written.
    pub async fn put(
        &self,
        secret: &[u8],
        context: &[u8],
        plaintext: &[u8],
        location: Option<Location>,
    ) -> Result<Location, SealedError> {
        let keys = self.derive(secret, context).await?;
        let location = location.unwrap_or(keys.location());
        self.seal(&keys, location, plaintext).await?;
        Ok(location)
    }

    /// Counterpart of [`SealedStore::put`].
    pub async fn get(
        &self,
        secret: &[u8],
        context: &[u8],
        location: Option<Location>,
    ) -> Result<(Location, Vec<u8>), SealedError> {
        let keys = self.derive(secret, context).await?;
        let location = location.unwrap_or(keys.location());
        let plaintext = self.open(&keys, location).await?;
        Ok((location, plaintext))
    }

    pub async fn put_record<T: Encoded>(
        &self,
        secret: &[u8],
        context: &[u8],
        value: &T,
        location: Option<Location>,
    ) -> Result<Location, SealedError> {
        self.put(secret, context, &value.encode()?, location).await
    }

    pub async fn get_record<T: Encoded>(
        &self,
        secret: &[u8],
        context: &[u8],
        location: Option<Location>,
    ) -> Result<(Location, T), SealedError> {
        let (location, plaintext) = self.get(secret, context, location).await?;
        Ok((location, decode_at(location, &plaintext)?))
    }

    pub async fn seal_record<T: Encoded>(
        &self,
        keys: &KeyTriple,
        location: Location,
        value: &T,
    ) -> Result<(), SealedError> {
        self.seal(keys, location, &value.encode()?).await
    }

    pub async fn open_record<T: Encoded>(
        &self,
        keys: &KeyTriple,
        location: Location,
    ) -> Result<T, SealedError> {
        let plaintext = self.open(keys, location).await?;
        decode_at(location, &plaintext)
    }

    pub async fn exists(&self, location: Location) -> Result<bool, SealedError> {
        self.datastore
            .exists(location)
            .await
            .map_err(|e| SealedError::Datastore(e.to_string()))
    }

    /// Best-effort delete. Returns whether anything was there to delete.
    pub async fn delete(&self, location: Location) -> Result<bool, SealedError> {
        if !self.exists(location).await? {
            tracing::warn!("nothing to delete at {}", location);
            return Ok(false);
        }
        tracing::debug!("delete {}", location);
        self.datastore
            .delete(location)
            .await
            .map_err(|e| SealedError::Datastore(e.to_string()))?;
        Ok(true)
    }

    /// Write a record as-is. Callers are responsible for its authenticity.
    pub async fn put_envelope(
        &self,
        location: Location,
        record: &SealedRecord,
    ) -> Result<(), SealedError> {
        tracing::debug!("put {}", location);
        self.datastore
            .put(location, Bytes::from(record.encode()?))
            .await
            .map_err(|e| SealedError::Datastore(e.to_string()))
    }

    /// Read a record without checking it.
    pub async fn get_envelope(&self, location: Location) -> Result<SealedRecord, SealedError> {
        tracing::debug!("get {}", location);
        let data = self
            .datastore
            .get(location)
            .await
            .map_err(|e| SealedError::Datastore(e.to_string()))?
            .ok_or(SealedError::Missing(location))?;
        decode_at(location, &data)
    }
}

/// The MAC covers the location too, so a record cannot be replayed at
/// another location sealed under the same key (chunks of one chain share a key).
fn mac_input(location: Location, ciphertext: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(16 + ciphertext.len());
    input.extend_from_slice(location.as_uuid().as_bytes());
    input.extend_from_slice(ciphertext);
    input
}

fn decode_at<T: Encoded>(location: Location, data: &[u8]) -> Result<T, SealedError> {
    T::decode(data).map_err(|e| {
        tracing::warn!("malformed record at {}: {}", location, e);
        SealedError::Integrity(location)
    })
}
