/**
 * File content and the trees that share it.
 *  - Chunk chains holding a file's bytes
 *  - File Access Control records owning a chain
 *  - Owner Access Control trees, sharing and revocation
 */
pub mod access;
/**
 * Sessions: user creation, login, and the
 *  file operations a user performs.
 */
pub mod client;
/**
 * Binary encoding for stored structures.
 */
pub mod codec;
/**
 * Loading client configuration from TOML
 *  and connecting to durable storage.
 */
pub mod config;
/**
 * Cryptographic types and operations.
 *  - Symmetric secrets and key derivation
 *  - Signing and encryption keypairs
 *  - Key-to-key secret sharing
 */
pub mod crypto;
/**
 * The untrusted key-value store, as a trait
 *  with in-memory and object-store backends.
 */
pub mod datastore;
/**
 * The public key directory, as a trait
 *  with in-memory and object-store backends.
 */
pub mod directory;
pub mod invitation;
pub mod location;
pub mod pointer;
/**
 * Authenticated encryption over the datastore.
 *  Every record written or read by the crate
 *  passes through here.
 */
pub mod sealed;

pub mod prelude {
    pub use crate::client::{Client, ClientError, User};
    pub use crate::config::ClientConfig;
    pub use crate::crypto::KdfParams;
    pub use crate::datastore::{Datastore, MemoryDatastore, ObjectDatastore};
    pub use crate::directory::{KeyDirectory, MemoryKeyDirectory, ObjectKeyDirectory};
    pub use crate::location::Location;
}
