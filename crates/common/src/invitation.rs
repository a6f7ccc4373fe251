//! Signed, hybrid-encrypted hand-off of an OAC node to another user
//!
//! The invitation payload is encrypted under a one-off [`Secret`], which is
//! wrapped for the recipient in a [`SecretShare`]. The sender signs the
//! location, the wrapped key and the ciphertext together.

use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Encoded};
use crate::crypto::{
    DecryptionKey, EncryptionKey, Secret, SecretError, SecretShare, SecretShareError, Signature,
    SigningKey, VerifyingKey,
};
use crate::location::Location;
use crate::sealed::SealedRecord;

#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("share error: {0}")]
    Share(#[from] SecretShareError),
    #[error("invitation at {0} failed verification")]
    Integrity(Location),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub oac_location: Location,
    pub oac_key: Secret,
    pub sender: String,
    pub recipient: String,
    /// The sender's name for the file
    pub filename: String,
}

impl Encoded for Invitation {}

/// Where `sender`'s invitation to `recipient` for `filename` is stored.
///
/// Deterministic so that revocation can find and delete it again.
pub fn invite_location(sender: &str, recipient: &str, filename: &str) -> Location {
    Location::from_parts(&[
        b"invitation".as_slice(),
        sender.as_bytes(),
        recipient.as_bytes(),
        filename.as_bytes(),
    ])
}

fn signed_message(location: Location, wrapped_key: &SecretShare, ciphertext: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(16 + wrapped_key.bytes().len() + ciphertext.len());
    message.extend_from_slice(location.as_uuid().as_bytes());
    message.extend_from_slice(wrapped_key.bytes());
    message.extend_from_slice(ciphertext);
    message
}

impl Invitation {
    /// Encrypt for `recipient` and sign with `signing_key`, ready to be
    /// written at `location`.
    pub fn seal(
        &self,
        location: Location,
        signing_key: &SigningKey,
        recipient: &EncryptionKey,
    ) -> Result<SealedRecord, InvitationError> {
        let payload_key = Secret::generate();
        let ciphertext = payload_key.encrypt(&self.encode()?)?;
        let wrapped_key = SecretShare::new(&payload_key, recipient)?;
        let signature = signing_key.sign(&signed_message(location, &wrapped_key, &ciphertext));

        Ok(SealedRecord {
            ciphertext,
            tag: signature.to_bytes().to_vec(),
            wrapped_key: Some(wrapped_key),
        })
    }

    /// Verify the sender's signature, then unwrap and decrypt.
    pub fn open(
        location: Location,
        envelope: &SealedRecord,
        sender: &VerifyingKey,
        decryption_key: &DecryptionKey,
    ) -> Result<Self, InvitationError> {
        let integrity = |reason: &str| {
            tracing::warn!("invitation at {}: {}", location, reason);
            InvitationError::Integrity(location)
        };

        let wrapped_key = envelope
            .wrapped_key
            .as_ref()
            .ok_or_else(|| integrity("no wrapped key"))?;
        let signature =
            Signature::from_slice(&envelope.tag).map_err(|_| integrity("malformed signature"))?;
        sender
            .verify(
                &signed_message(location, wrapped_key, &envelope.ciphertext),
                &signature,
            )
            .map_err(|_| integrity("bad signature"))?;

        let payload_key = wrapped_key
            .recover(decryption_key)
            .map_err(|_| integrity("cannot unwrap payload key"))?;
        let plaintext = payload_key
            .decrypt(&envelope.ciphertext)
            .map_err(|_| integrity("cannot decrypt payload"))?;
        Self::decode(&plaintext).map_err(|_| integrity("malformed payload"))
    }
}
