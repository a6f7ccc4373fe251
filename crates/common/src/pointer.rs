use serde::{Deserialize, Serialize};

use crate::codec::Encoded;
use crate::crypto::Secret;
use crate::datastore::Datastore;
use crate::location::Location;
use crate::sealed::{SealedError, SealedStore};

/// A user's private entry resolving a filename to an OAC node.
///
/// Sealed under `(filename, user_key || filename)`, so only the user holding
/// `user_key` can find it, read it or replace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePointer {
    pub access_location: Location,
    pub access_key: Secret,
    /// Whether this pointer leads to the root of the tree
    pub is_owner: bool,
    pub filename: String,
}

impl Encoded for FilePointer {}

fn context(user_key: &Secret, filename: &str) -> Vec<u8> {
    let mut context = Vec::with_capacity(user_key.len() + filename.len());
    context.extend_from_slice(user_key.bytes());
    context.extend_from_slice(filename.as_bytes());
    context
}

impl FilePointer {
    /// Look up the pointer for `filename`, `None` if the user has none.
    pub async fn load<D: Datastore>(
        store: &SealedStore<D>,
        user_key: &Secret,
        filename: &str,
    ) -> Result<Option<Self>, SealedError> {
        let result = store
            .get_record::<FilePointer>(filename.as_bytes(), &context(user_key, filename), None)
            .await;
        match result {
            Ok((_, pointer)) if pointer.filename == filename => Ok(Some(pointer)),
            Ok((location, _)) => Err(SealedError::Integrity(location)),
            Err(SealedError::Missing(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write (or overwrite) the pointer.
    pub async fn save<D: Datastore>(
        &self,
        store: &SealedStore<D>,
        user_key: &Secret,
    ) -> Result<Location, SealedError> {
        store
            .put_record(
                self.filename.as_bytes(),
                &context(user_key, &self.filename),
                self,
                None,
            )
            .await
    }
}
