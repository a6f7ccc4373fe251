use crate::access::AccessError;
use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::invitation::InvitationError;
use crate::location::Location;
use crate::sealed::SealedError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("user {0} already exists")]
    DuplicateUser(String),
    #[error("invalid username")]
    InvalidUsername,
    /// Wrong password, damaged user record, or no such user. Deliberately
    /// not told apart.
    #[error("authentication failed")]
    AuthenticationFailure,
    #[error("integrity check failed for record at {0}")]
    Integrity(Location),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("recipient {0} has no published key")]
    RecipientUnknown(String),
    #[error("sender {0} has no published key")]
    SenderUnknown(String),
    #[error("not shared: {0}")]
    NotShared(String),
    #[error("only the owner of {0} can revoke access to it")]
    NotOwner(String),
    #[error("file {0} already exists")]
    FileExists(String),
    #[error("datastore error: {0}")]
    Datastore(String),
    #[error("key directory error: {0}")]
    KeyDirectory(String),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("client error: {0}")]
    Default(#[from] anyhow::Error),
}

impl From<SealedError> for ClientError {
    fn from(e: SealedError) -> Self {
        match e {
            SealedError::Missing(location) => ClientError::NotFound(location.to_string()),
            SealedError::Integrity(location) => ClientError::Integrity(location),
            SealedError::Datastore(e) => ClientError::Datastore(e),
            SealedError::Codec(e) => ClientError::Codec(e),
            SealedError::Secret(e) => ClientError::Crypto(e.to_string()),
            SealedError::Kdf(e) => ClientError::Crypto(e.to_string()),
            SealedError::Default(e) => ClientError::Default(e),
        }
    }
}

impl From<AccessError> for ClientError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Sealed(e) => e.into(),
            AccessError::NotShared(location) => ClientError::NotShared(location.to_string()),
        }
    }
}

impl From<InvitationError> for ClientError {
    fn from(e: InvitationError) -> Self {
        match e {
            InvitationError::Integrity(location) => ClientError::Integrity(location),
            InvitationError::Codec(e) => ClientError::Codec(e),
            InvitationError::Secret(e) => ClientError::Crypto(e.to_string()),
            InvitationError::Share(e) => ClientError::Crypto(e.to_string()),
        }
    }
}
