//! Turning a `(secret, context)` pair into a location and two keys
//!
//! Argon2id hardens the pair into a root key, HKDF-SHA256 expands the root
//! into an encryption key and a MAC key, and the context alone picks the
//! storage location. Same inputs, same outputs, no stored state.

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::secret::{Secret, SECRET_SIZE};
use crate::location::Location;

/// Size of a MAC tag in bytes
pub const MAC_SIZE: usize = 32;

const SALT_DOMAIN: &str = "sharelock 2024-06-01 argon2id salt";
const ENCRYPTION_INFO: &[u8] = b"encryption";
const MAC_INFO: &[u8] = b"mac";

#[derive(Debug, thiserror::Error)]
pub enum KdfError {
    #[error("invalid kdf parameters: {0}")]
    Params(String),
    #[error("argon2 failed: {0}")]
    Argon2(String),
    #[error("hkdf expand failed: {0}")]
    Expand(String),
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub mem_cost_kib: u32,
    /// Number of passes
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    fn hasher(&self) -> Result<Argon2<'static>, KdfError> {
        let params = Params::new(
            self.mem_cost_kib,
            self.time_cost,
            self.parallelism,
            Some(SECRET_SIZE),
        )
        .map_err(|e| KdfError::Params(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Check the parameters without running the hash.
    pub fn validate(&self) -> Result<(), KdfError> {
        self.hasher().map(|_| ())
    }
}

/// Location plus the two purpose-scoped keys for one record.
#[derive(Clone)]
pub struct KeyTriple {
    location: Location,
    encryption_key: Secret,
    mac_key: [u8; SECRET_SIZE],
}

impl std::fmt::Debug for KeyTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyTriple")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl KeyTriple {
    /// The location derived from the context
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn encryption_key(&self) -> &Secret {
        &self.encryption_key
    }

    /// Keyed BLAKE3 over `data`.
    pub fn mac(&self, data: &[u8]) -> [u8; MAC_SIZE] {
        *blake3::keyed_hash(&self.mac_key, data).as_bytes()
    }

    /// Check a tag in constant time.
    pub fn verify_mac(&self, data: &[u8], tag: &[u8]) -> bool {
        let Ok(tag) = <[u8; MAC_SIZE]>::try_from(tag) else {
            return false;
        };
        // blake3::Hash equality is constant time
        blake3::keyed_hash(&self.mac_key, data) == blake3::Hash::from(tag)
    }
}

/// Derive the key triple for `(secret, context)`.
///
/// This runs Argon2id and is deliberately slow; async callers should move it
/// off the runtime threads.
pub fn derive(secret: &[u8], context: &[u8], params: &KdfParams) -> Result<KeyTriple, KdfError> {
    let salt = blake3::derive_key(SALT_DOMAIN, context);

    let mut root = [0u8; SECRET_SIZE];
    params
        .hasher()?
        .hash_password_into(secret, &salt, &mut root)
        .map_err(|e| KdfError::Argon2(e.to_string()))?;

    let hk = Hkdf::<Sha256>::new(None, &root);
    let mut encryption_key = [0u8; SECRET_SIZE];
    hk.expand(ENCRYPTION_INFO, &mut encryption_key)
        .map_err(|e| KdfError::Expand(e.to_string()))?;
    let mut mac_key = [0u8; SECRET_SIZE];
    hk.expand(MAC_INFO, &mut mac_key)
        .map_err(|e| KdfError::Expand(e.to_string()))?;

    Ok(KeyTriple {
        location: Location::from_context(context),
        encryption_key: Secret::from(encryption_key),
        mac_key,
    })
}

/// One random key standing in as both secret and context: the key alone
/// locates the record and unlocks it.
pub fn derive_location_and_keys(secret: &Secret, params: &KdfParams) -> Result<KeyTriple, KdfError> {
    derive(secret.bytes(), secret.bytes(), params)
}
