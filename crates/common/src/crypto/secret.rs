//! Symmetric encryption using ChaCha20-Poly1305
//!
//! Every record key in the system is a [`Secret`]: FAC keys, OAC keys, chunk
//! keys, the per-user file key and the per-invitation payload key.

use std::ops::Deref;

use chacha20poly1305::Key;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Serialize};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of ChaCha20-Poly1305 key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Fill a fixed-size buffer from the OS RNG.
///
/// # Panics
///
/// Panics if the operating system cannot provide randomness.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buff = [0u8; N];
    getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
    buff
}

/// A 256-bit symmetric key.
///
/// Encrypted format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate();
/// let ciphertext = secret.encrypt(b"sensitive data")?;
/// let recovered = secret.decrypt(&ciphertext)?;
/// assert_eq!(b"sensitive data", &recovered[..]);
/// ```
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Secret([u8; SECRET_SIZE]);

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Secret").field(&"[REDACTED]").finish()
    }
}

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        Self(random_bytes())
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(anyhow::anyhow!(
                "invalid secret size, expected {}, got {}",
                SECRET_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt data under a fresh random nonce.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));

        let nonce_bytes: [u8; NONCE_SIZE] = random_bytes();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(out)
    }

    /// Decrypt data produced by [`Secret::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short to hold a nonce, or if the
    /// authentication tag does not verify (wrong key or tampered data).
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        if data.len() < NONCE_SIZE {
            return Err(anyhow::anyhow!("data too short for nonce").into());
        }

        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let plaintext = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| anyhow::anyhow!("decrypt error"))?;

        Ok(plaintext)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secret_encrypt_decrypt() {
        let secret = Secret::generate();
        let data = b"hello world, this is a test message for encryption";

        let encrypted = secret.encrypt(data).unwrap();
        let decrypted = secret.decrypt(&encrypted).unwrap();

        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let secret = Secret::generate();
        let a = secret.encrypt(b"same").unwrap();
        let b = secret.encrypt(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_secret_size_validation() {
        assert!(Secret::from_slice(&[1u8; 16]).is_err());
        assert!(Secret::from_slice(&[1u8; 64]).is_err());
        assert!(Secret::from_slice(&[1u8; SECRET_SIZE]).is_ok());
    }

    #[test]
    fn test_decrypt_rejects_tampering_and_wrong_key() {
        let secret = Secret::generate();
        let mut encrypted = secret.encrypt(b"test data for integrity check").unwrap();

        assert!(Secret::generate().decrypt(&encrypted).is_err());

        encrypted[NONCE_SIZE + 3] ^= 0x01;
        assert!(secret.decrypt(&encrypted).is_err());
        assert!(secret.decrypt(&encrypted[..4]).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::from([7u8; SECRET_SIZE]);
        assert_eq!(format!("{:?}", secret), "Secret(\"[REDACTED]\")");
    }
}
