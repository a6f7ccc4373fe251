mod chunk;
mod fac;
mod oac;

pub use chunk::Chunk;
pub use fac::FileAccess;
pub use oac::{OacNode, SharedChild};

use crate::location::Location;
use crate::sealed::SealedError;

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Sealed(#[from] SealedError),
    #[error("no share with invite location {0}")]
    NotShared(Location),
}

impl AccessError {
    /// Missing or damaged nodes are skipped during tree walks: a node we
    /// cannot read is one whose holder loses access anyway.
    pub(crate) fn skippable(&self) -> Option<&SealedError> {
        match self {
            AccessError::Sealed(e @ (SealedError::Missing(_) | SealedError::Integrity(_))) => {
                Some(e)
            }
            _ => None,
        }
    }
}
