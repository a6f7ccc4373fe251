use serde::{Deserialize, Serialize};

use super::ClientError;
use crate::access::{AccessError, FileAccess, OacNode};
use crate::codec::Encoded;
use crate::crypto::{DecryptionKey, EncryptionKey, Secret, SigningKey, VerifyingKey};
use crate::datastore::Datastore;
use crate::directory::{encrypt_tag, verify_tag, KeyDirectory, PublicKey};
use crate::invitation::{invite_location, Invitation};
use crate::location::Location;
use crate::pointer::FilePointer;
use crate::sealed::{SealedError, SealedStore};

/// A user's private state, sealed under `(password, name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    /// Scopes the user's file pointers
    pub user_key: Secret,
    pub signing_key: SigningKey,
    pub decryption_key: DecryptionKey,
}

impl Encoded for UserRecord {}

/// A logged-in user.
///
/// Holds nothing but the user's own keys; every operation re-reads what it
/// needs from the datastore, so several sessions of one user stay coherent.
#[derive(Debug, Clone)]
pub struct User<D: Datastore, K: KeyDirectory> {
    record: UserRecord,
    store: SealedStore<D>,
    directory: K,
}

impl<D: Datastore, K: KeyDirectory> User<D, K> {
    pub(crate) fn new(record: UserRecord, store: SealedStore<D>, directory: K) -> Self {
        Self {
            record,
            store,
            directory,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.record.signing_key.public()
    }

    pub fn encryption_key(&self) -> EncryptionKey {
        self.record.decryption_key.public()
    }

    async fn pointer(&self, filename: &str) -> Result<Option<FilePointer>, ClientError> {
        Ok(FilePointer::load(&self.store, &self.record.user_key, filename).await?)
    }

    async fn require_pointer(&self, filename: &str) -> Result<FilePointer, ClientError> {
        self.pointer(filename)
            .await?
            .ok_or_else(|| ClientError::NotFound(filename.to_string()))
    }

    /// Resolve `filename` down to the node it points at.
    async fn resolve(&self, filename: &str) -> Result<OacNode, ClientError> {
        let pointer = self.require_pointer(filename).await?;
        let (_, node) = OacNode::load(&self.store, pointer.access_location, &pointer.access_key)
            .await
            .map_err(|e| match e {
                AccessError::Sealed(SealedError::Missing(_)) => {
                    ClientError::NotFound(filename.to_string())
                }
                e => e.into(),
            })?;
        Ok(node)
    }

    /// Store `content` under `filename`, replacing whatever was there.
    ///
    /// On a filename the user already has, the file's chain is swapped in
    /// place so every user it is shared with sees the new content.
    pub async fn store_file(&self, filename: &str, content: &[u8]) -> Result<(), ClientError> {
        tracing::debug!("{} storing {}", self.name(), filename);

        if let Some(pointer) = self.pointer(filename).await? {
            match OacNode::load(&self.store, pointer.access_location, &pointer.access_key).await {
                Ok((_, node)) => {
                    FileAccess::replace_content(
                        &self.store,
                        node.fac_location,
                        &node.fac_key,
                        content,
                    )
                    .await?;
                    return Ok(());
                }
                // revoked share, the name is free again
                Err(AccessError::Sealed(SealedError::Missing(_))) => {
                    tracing::info!(
                        "{} no longer has access to {}, storing fresh",
                        self.name(),
                        filename
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (access_location, access_key) = OacNode::create_root(&self.store, content).await?;
        FilePointer {
            access_location,
            access_key,
            is_owner: true,
            filename: filename.to_string(),
        }
        .save(&self.store, &self.record.user_key)
        .await?;
        Ok(())
    }

    pub async fn append_to_file(&self, filename: &str, content: &[u8]) -> Result<(), ClientError> {
        tracing::debug!("{} appending to {}", self.name(), filename);
        let node = self.resolve(filename).await?;
        FileAccess::append_content(&self.store, node.fac_location, &node.fac_key, content).await?;
        Ok(())
    }

    pub async fn load_file(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        tracing::debug!("{} loading {}", self.name(), filename);
        let node = self.resolve(filename).await?;
        Ok(FileAccess::read_content(&self.store, node.fac_location, &node.fac_key).await?)
    }

    /// Share `filename` with `recipient`, returning where the invitation was
    /// stored. The recipient passes that location to
    /// [`User::accept_invitation`].
    pub async fn create_invitation(
        &self,
        filename: &str,
        recipient: &str,
    ) -> Result<Location, ClientError> {
        let recipient_key = self
            .lookup(&encrypt_tag(recipient))
            .await?
            .as_ref()
            .and_then(PublicKey::as_encryption)
            .copied()
            .ok_or_else(|| ClientError::RecipientUnknown(recipient.to_string()))?;
        let pointer = self.require_pointer(filename).await?;

        let location = invite_location(self.name(), recipient, filename);
        let child = OacNode::share(
            &self.store,
            pointer.access_location,
            &pointer.access_key,
            location,
        )
        .await
        .map_err(|e| match e {
            AccessError::Sealed(SealedError::Missing(_)) => {
                ClientError::NotFound(filename.to_string())
            }
            e => e.into(),
        })?;

        let invitation = Invitation {
            oac_location: child.location,
            oac_key: child.key,
            sender: self.name().to_string(),
            recipient: recipient.to_string(),
            filename: filename.to_string(),
        };
        let envelope = invitation.seal(location, &self.record.signing_key, &recipient_key)?;
        self.store.put_envelope(location, &envelope).await?;

        tracing::info!("{} invited {} to {}", self.name(), recipient, filename);
        Ok(location)
    }

    /// Accept `sender`'s invitation, making it available as `filename`.
    pub async fn accept_invitation(
        &self,
        sender: &str,
        location: Location,
        filename: &str,
    ) -> Result<(), ClientError> {
        let envelope = self.store.get_envelope(location).await.map_err(|e| match e {
            SealedError::Missing(_) => ClientError::NotFound(format!("invitation {}", location)),
            e => e.into(),
        })?;

        let sender_key = self
            .lookup(&verify_tag(sender))
            .await?
            .as_ref()
            .and_then(PublicKey::as_verifying)
            .copied()
            .ok_or_else(|| ClientError::SenderUnknown(sender.to_string()))?;

        let invitation =
            Invitation::open(location, &envelope, &sender_key, &self.record.decryption_key)?;
        if invitation.sender != sender || invitation.recipient != self.name() {
            tracing::warn!(
                "invitation at {} is from {} to {}, expected {} to {}",
                location,
                invitation.sender,
                invitation.recipient,
                sender,
                self.name()
            );
            return Err(ClientError::Integrity(location));
        }

        if let Some(existing) = self.pointer(filename).await? {
            if existing.access_location != invitation.oac_location
                && self.is_live(&existing).await?
            {
                return Err(ClientError::FileExists(filename.to_string()));
            }
        }

        FilePointer {
            access_location: invitation.oac_location,
            access_key: invitation.oac_key,
            is_owner: false,
            filename: filename.to_string(),
        }
        .save(&self.store, &self.record.user_key)
        .await?;

        tracing::info!(
            "{} accepted {} from {} as {}",
            self.name(),
            invitation.filename,
            sender,
            filename
        );
        Ok(())
    }

    /// Revoke `recipient`'s access to `filename`, and that of everyone they
    /// shared it with. Only the file's owner can do this.
    pub async fn revoke_access(&self, filename: &str, recipient: &str) -> Result<(), ClientError> {
        let pointer = self.require_pointer(filename).await?;
        if !pointer.is_owner {
            return Err(ClientError::NotOwner(filename.to_string()));
        }

        let location = invite_location(self.name(), recipient, filename);
        OacNode::revoke(
            &self.store,
            pointer.access_location,
            &pointer.access_key,
            location,
        )
        .await
        .map_err(|e| match e {
            AccessError::NotShared(_) => {
                ClientError::NotShared(format!("{} with {}", filename, recipient))
            }
            e => e.into(),
        })?;

        tracing::info!("{} revoked {} from {}", self.name(), recipient, filename);
        Ok(())
    }

    /// Whether the node behind `pointer` still exists. Pointers left behind
    /// by a revocation can be reused.
    async fn is_live(&self, pointer: &FilePointer) -> Result<bool, ClientError> {
        match OacNode::load(&self.store, pointer.access_location, &pointer.access_key).await {
            Ok(_) => Ok(true),
            Err(AccessError::Sealed(SealedError::Missing(_))) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup(&self, tag: &str) -> Result<Option<PublicKey>, ClientError> {
        self.directory
            .lookup(tag)
            .await
            .map_err(|e| ClientError::KeyDirectory(e.to_string()))
    }
}
