//! Cryptographic primitives for sharelock
//!
//! This module provides the cryptographic foundation for the storage protocol:
//!
//! - **Identity & Authentication**: Ed25519 keypairs for signing invitations
//! - **Encryption**: ChaCha20-Poly1305 for record contents, keyed BLAKE3 as the MAC
//! - **Key Sharing**: X25519 ECDH + AES Key Wrap to hand a [`Secret`] to one recipient
//! - **Key Derivation**: Argon2id + HKDF-SHA256 turning `(secret, context)` into a
//!   storage location and purpose-scoped keys
//!
//! # Security Model
//!
//! ## User Identity
//! Each user holds two keypairs. The Ed25519 pair (`SigningKey`/`VerifyingKey`)
//! signs invitations; the X25519 pair (`DecryptionKey`/`EncryptionKey`) receives
//! wrapped secrets. Only the public halves are ever published.
//!
//! ## Record Encryption
//! Every stored record is encrypted and MAC'd under keys derived from a
//! `(secret, context)` pair with [`derive`]. Knowing the pair is the capability:
//! it both locates the record and unlocks it.
//!
//! ## Key Sharing Protocol
//! To hand a secret to another user:
//! 1. Generate an ephemeral X25519 secret
//! 2. Perform ECDH against the recipient's published [`EncryptionKey`]
//! 3. Derive a key-encryption key from the shared point
//! 4. Use AES-KW to wrap the secret
//! 5. Package as a [`SecretShare`] (ephemeral_pubkey || wrapped_secret)

mod kdf;
mod keys;
mod secret;
mod secret_share;

pub use ed25519_dalek::Signature;
pub use kdf::{derive, derive_location_and_keys, KdfError, KdfParams, KeyTriple, MAC_SIZE};
pub use keys::{DecryptionKey, EncryptionKey, KeyError, SigningKey, VerifyingKey, KEY_SIZE};
pub use secret::{random_bytes, Secret, SecretError, SECRET_SIZE};
pub use secret_share::{SecretShare, SecretShareError, SECRET_SHARE_SIZE};
