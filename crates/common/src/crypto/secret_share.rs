//! Handing a [`Secret`] to exactly one recipient
//!
//! The sender generates an ephemeral X25519 key, agrees on a shared point with
//! the recipient's published [`EncryptionKey`], runs that point through BLAKE3
//! key derivation and uses the result as an AES-256 key-wrap KEK (RFC 3394).
//!
//! Only the holder of the matching [`DecryptionKey`] can unwrap. AES-KW carries
//! its own integrity check, so a share that was altered or addressed to
//! someone else fails to unwrap instead of yielding a wrong key.

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Serialize};

use super::keys::{DecryptionKey, EncryptionKey, KEY_SIZE};
use super::secret::{Secret, SECRET_SIZE};

/// AES-KW integrity block prepended to the wrapped key
pub const KW_BLOCK_SIZE: usize = 8;
/// Wire size of a share: ephemeral public key (32) || wrapped secret (40)
pub const SECRET_SHARE_SIZE: usize = KEY_SIZE + SECRET_SIZE + KW_BLOCK_SIZE;

const KEK_DOMAIN: &str = "sharelock 2024-06-01 secret share kek";

#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    #[error("share error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("invalid share size, expected {SECRET_SHARE_SIZE}, got {0}")]
    Size(usize),
}

/// A secret wrapped for a single recipient.
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_secret: 40 bytes ]
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct SecretShare([u8; SECRET_SHARE_SIZE]);

impl TryFrom<&[u8]> for SecretShare {
    type Error = SecretShareError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != SECRET_SHARE_SIZE {
            return Err(SecretShareError::Size(bytes.len()));
        }
        let mut buff = [0; SECRET_SHARE_SIZE];
        buff.copy_from_slice(bytes);
        Ok(Self(buff))
    }
}

impl TryFrom<Vec<u8>> for SecretShare {
    type Error = SecretShareError;
    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_from(bytes.as_slice())
    }
}

impl From<SecretShare> for Vec<u8> {
    fn from(share: SecretShare) -> Self {
        share.0.to_vec()
    }
}

fn kek(shared_point: &[u8; KEY_SIZE], ephemeral: &EncryptionKey) -> Kek {
    let mut material = Vec::with_capacity(KEY_SIZE * 2);
    material.extend_from_slice(shared_point);
    material.extend_from_slice(&ephemeral.to_bytes());
    Kek::from(blake3::derive_key(KEK_DOMAIN, &material))
}

impl SecretShare {
    /// Wrap `secret` so that only the owner of `recipient` can recover it.
    pub fn new(secret: &Secret, recipient: &EncryptionKey) -> Result<Self, SecretShareError> {
        let ephemeral = DecryptionKey::generate();
        let ephemeral_public = ephemeral.public();
        let shared_point = ephemeral.diffie_hellman(recipient);

        let wrapped = kek(&shared_point, &ephemeral_public)
            .wrap_vec(secret.bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        let mut share = [0; SECRET_SHARE_SIZE];
        if KEY_SIZE + wrapped.len() != SECRET_SHARE_SIZE {
            return Err(SecretShareError::Size(KEY_SIZE + wrapped.len()));
        }
        share[..KEY_SIZE].copy_from_slice(&ephemeral_public.to_bytes());
        share[KEY_SIZE..].copy_from_slice(&wrapped);

        Ok(Self(share))
    }

    /// Recover the wrapped secret with the recipient's private key.
    ///
    /// # Errors
    ///
    /// Fails if the share was made for someone else or has been altered.
    pub fn recover(&self, recipient: &DecryptionKey) -> Result<Secret, SecretShareError> {
        let mut ephemeral_bytes = [0; KEY_SIZE];
        ephemeral_bytes.copy_from_slice(&self.0[..KEY_SIZE]);
        let ephemeral_public = EncryptionKey::from(ephemeral_bytes);
        let shared_point = recipient.diffie_hellman(&ephemeral_public);

        let unwrapped = kek(&shared_point, &ephemeral_public)
            .unwrap_vec(&self.0[KEY_SIZE..])
            .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?;

        Secret::from_slice(&unwrapped).map_err(|_| SecretShareError::Size(unwrapped.len()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex: &str) -> Result<Self, SecretShareError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|_| anyhow::anyhow!("hex decode error"))?;
        Self::try_from(bytes)
    }
}
