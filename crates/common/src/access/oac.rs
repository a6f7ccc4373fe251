//! Owner Access Control tree
//!
//! The tree lives entirely in the datastore. Each node is a record reached
//! through a `(location, key)` capability held by its parent (or, for the
//! root and for accepted shares, by a user's file pointer). Walks over the
//! tree are explicit worklists over fetched child lists.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::{AccessError, FileAccess};
use crate::codec::Encoded;
use crate::crypto::{KeyTriple, Secret};
use crate::datastore::Datastore;
use crate::location::Location;
use crate::sealed::SealedStore;

/// A parent's reference to a node it created by sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedChild {
    pub location: Location,
    pub key: Secret,
    /// Where the invitation carrying this node was (or will be) stored
    pub invite_location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OacNode {
    pub fac_location: Location,
    pub fac_key: Secret,
    pub children: Vec<SharedChild>,
}

impl Encoded for OacNode {}

impl OacNode {
    /// Create a root node over a new FAC holding `content`.
    pub async fn create_root<D: Datastore>(
        store: &SealedStore<D>,
        content: &[u8],
    ) -> Result<(Location, Secret), AccessError> {
        let (fac_location, fac_key) = FileAccess::create(store, content).await?;
        let node = OacNode {
            fac_location,
            fac_key,
            children: Vec::new(),
        };

        let key = Secret::generate();
        let keys = store.derive_location_and_keys(&key).await?;
        node.persist(store, &keys, keys.location()).await?;

        tracing::debug!("created root node at {}", keys.location());
        Ok((keys.location(), key))
    }

    pub async fn load<D: Datastore>(
        store: &SealedStore<D>,
        location: Location,
        key: &Secret,
    ) -> Result<(KeyTriple, Self), AccessError> {
        let keys = store.derive_location_and_keys(key).await?;
        let node = store.open_record(&keys, location).await?;
        Ok((keys, node))
    }

    pub async fn persist<D: Datastore>(
        &self,
        store: &SealedStore<D>,
        keys: &KeyTriple,
        location: Location,
    ) -> Result<(), AccessError> {
        store.seal_record(keys, location, self).await?;
        Ok(())
    }

    /// Add a child under the node at `location`.
    ///
    /// The child is written before the parent learns about it. If the parent
    /// write is lost the child is an unreachable orphan and the share can
    /// simply be retried.
    pub async fn share<D: Datastore>(
        store: &SealedStore<D>,
        location: Location,
        key: &Secret,
        invite_location: Location,
    ) -> Result<SharedChild, AccessError> {
        let (keys, mut parent) = Self::load(store, location, key).await?;

        let child_key = Secret::generate();
        let child_keys = store.derive_location_and_keys(&child_key).await?;
        let child = OacNode {
            fac_location: parent.fac_location,
            fac_key: parent.fac_key.clone(),
            children: Vec::new(),
        };
        child
            .persist(store, &child_keys, child_keys.location())
            .await?;

        let shared = SharedChild {
            location: child_keys.location(),
            key: child_key,
            invite_location,
        };
        parent.children.push(shared.clone());
        parent.persist(store, &keys, location).await?;

        tracing::debug!("node {} shared as {}", location, shared.location);
        Ok(shared)
    }

    /// Revoke every direct child of the root whose invite location matches.
    ///
    /// The content is copied into a brand new FAC, every kept node is
    /// re-pointed at it, and the revoked subtrees are deleted along with
    /// their invitations. The root is written last: until then it still
    /// lists the revoked children, so an interrupted revocation can simply
    /// be run again. Orphaned FACs and chunks are left in place.
    pub async fn revoke<D: Datastore>(
        store: &SealedStore<D>,
        location: Location,
        key: &Secret,
        invite_location: Location,
    ) -> Result<(), AccessError> {
        let (keys, mut root) = Self::load(store, location, key).await?;

        let (revoked, kept): (Vec<_>, Vec<_>) = root
            .children
            .iter()
            .cloned()
            .partition(|child| child.invite_location == invite_location);
        if revoked.is_empty() {
            return Err(AccessError::NotShared(invite_location));
        }

        let content = FileAccess::read_content(store, root.fac_location, &root.fac_key).await?;
        let (fac_location, fac_key) = FileAccess::create(store, &content).await?;
        root.children = kept;
        root.fac_location = fac_location;
        root.fac_key = fac_key;
        root.rekey_descendants(store, location).await?;

        // children come after their parents, delete back to front
        let doomed = Self::collect_subtrees(store, location, revoked).await?;
        for node in doomed.iter().rev() {
            store.delete(node.location).await?;
            store.delete(node.invite_location).await?;
        }
        tracing::debug!("deleted {} revoked nodes", doomed.len());

        root.persist(store, &keys, location).await
    }

    /// Breadth-first list of `roots` and everything below them.
    async fn collect_subtrees<D: Datastore>(
        store: &SealedStore<D>,
        owner: Location,
        roots: Vec<SharedChild>,
    ) -> Result<Vec<SharedChild>, AccessError> {
        let mut seen = HashSet::from([owner]);
        let mut queue = VecDeque::from(roots);
        let mut collected = Vec::new();

        while let Some(child) = queue.pop_front() {
            if !seen.insert(child.location) {
                continue;
            }
            match Self::load(store, child.location, &child.key).await {
                Ok((_, node)) => queue.extend(node.children),
                Err(e) => match e.skippable() {
                    Some(reason) => {
                        tracing::warn!("cannot walk below {}: {}", child.location, reason)
                    }
                    None => return Err(e),
                },
            }
            collected.push(child);
        }

        Ok(collected)
    }

    /// Point every node below this one at this node's FAC.
    async fn rekey_descendants<D: Datastore>(
        &self,
        store: &SealedStore<D>,
        location: Location,
    ) -> Result<(), AccessError> {
        let mut seen = HashSet::from([location]);
        let mut queue: VecDeque<SharedChild> = self.children.iter().cloned().collect();
        let mut count = 0;

        while let Some(child) = queue.pop_front() {
            if !seen.insert(child.location) {
                continue;
            }
            let (keys, mut node) = match Self::load(store, child.location, &child.key).await {
                Ok(loaded) => loaded,
                Err(e) => match e.skippable() {
                    Some(reason) => {
                        tracing::warn!("skipping re-key of {}: {}", child.location, reason);
                        continue;
                    }
                    None => return Err(e),
                },
            };

            node.fac_location = self.fac_location;
            node.fac_key = self.fac_key.clone();
            node.persist(store, &keys, child.location).await?;
            queue.extend(node.children);
            count += 1;
        }

        tracing::debug!("re-keyed {} nodes", count);
        Ok(())
    }
}
