use ed25519_dalek::Signer;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::secret::random_bytes;

/// Size of every private and public key in bytes (Ed25519 and X25519 alike)
pub const KEY_SIZE: usize = 32;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("signature error: {0}")]
    Signature(#[from] ed25519_dalek::SignatureError),
}

fn decode_hex(hex: &str) -> Result<[u8; KEY_SIZE], KeyError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut buff = [0; KEY_SIZE];
    hex::decode_to_slice(hex, &mut buff).map_err(|_| anyhow::anyhow!("key hex decode error"))?;
    Ok(buff)
}

/// Private half of a user's Ed25519 signing keypair.
///
/// Signs invitation envelopes so recipients can check who issued them.
/// Serialized as its 32 raw bytes; only ever stored inside the user's own
/// sealed record.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "[u8; KEY_SIZE]", into = "[u8; KEY_SIZE]")]
pub struct SigningKey(ed25519_dalek::SigningKey);

impl From<[u8; KEY_SIZE]> for SigningKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }
}

impl From<SigningKey> for [u8; KEY_SIZE] {
    fn from(key: SigningKey) -> Self {
        key.to_bytes()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.public().to_hex())
            .finish()
    }
}

impl SigningKey {
    /// Generate a new random signing key
    pub fn generate() -> Self {
        Self::from(random_bytes::<KEY_SIZE>())
    }

    /// Derive the verifying key that is published to the key directory
    pub fn public(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Parse a signing key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Ok(Self::from(decode_hex(hex)?))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Sign a message, returning a detached signature.
    pub fn sign(&self, msg: &[u8]) -> ed25519_dalek::Signature {
        self.0.sign(msg)
    }
}

/// Public half of a user's Ed25519 signing keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; KEY_SIZE]", into = "[u8; KEY_SIZE]")]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

impl TryFrom<[u8; KEY_SIZE]> for VerifyingKey {
    type Error = KeyError;
    fn try_from(bytes: [u8; KEY_SIZE]) -> Result<Self, Self::Error> {
        Ok(Self(ed25519_dalek::VerifyingKey::from_bytes(&bytes)?))
    }
}

impl From<VerifyingKey> for [u8; KEY_SIZE] {
    fn from(key: VerifyingKey) -> Self {
        key.to_bytes()
    }
}

impl VerifyingKey {
    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Parse a verifying key from a hexadecimal string
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Self::try_from(decode_hex(hex)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Verify an Ed25519 signature on a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature does not verify under this key.
    pub fn verify(
        &self,
        msg: &[u8],
        signature: &ed25519_dalek::Signature,
    ) -> Result<(), KeyError> {
        self.0.verify_strict(msg, signature)?;
        Ok(())
    }
}

/// Private half of a user's X25519 encryption keypair.
///
/// Recovers secrets that other users wrapped for us in a
/// [`SecretShare`](super::SecretShare).
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "[u8; KEY_SIZE]", into = "[u8; KEY_SIZE]")]
pub struct DecryptionKey(StaticSecret);

impl From<[u8; KEY_SIZE]> for DecryptionKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(StaticSecret::from(bytes))
    }
}

impl From<DecryptionKey> for [u8; KEY_SIZE] {
    fn from(key: DecryptionKey) -> Self {
        key.0.to_bytes()
    }
}

impl std::fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("public", &self.public().to_hex())
            .finish()
    }
}

impl DecryptionKey {
    /// Generate a new random decryption key
    pub fn generate() -> Self {
        Self::from(random_bytes::<KEY_SIZE>())
    }

    /// Derive the encryption key that is published to the key directory
    pub fn public(&self) -> EncryptionKey {
        EncryptionKey(X25519PublicKey::from(&self.0))
    }

    pub(crate) fn diffie_hellman(&self, other: &EncryptionKey) -> [u8; KEY_SIZE] {
        *self.0.diffie_hellman(&other.0).as_bytes()
    }
}

/// Public half of a user's X25519 encryption keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; KEY_SIZE]", into = "[u8; KEY_SIZE]")]
pub struct EncryptionKey(X25519PublicKey);

impl From<[u8; KEY_SIZE]> for EncryptionKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(X25519PublicKey::from(bytes))
    }
}

impl From<EncryptionKey> for [u8; KEY_SIZE] {
    fn from(key: EncryptionKey) -> Self {
        key.to_bytes()
    }
}

impl EncryptionKey {
    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Ok(Self::from(decode_hex(hex)?))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}
