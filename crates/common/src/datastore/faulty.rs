use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::{Datastore, DatastoreError, MemoryDatastore, MemoryDatastoreError};
use crate::location::Location;

/// In-memory datastore whose writes can be made to fail on demand
///
/// Wraps a [`MemoryDatastore`]; reads always go through. Used to interrupt
/// multi-step operations half way and check that retrying them converges.
#[derive(Debug, Clone, Default)]
pub struct FaultyDatastore {
    inner: MemoryDatastore,
    faults: Arc<Mutex<Faults>>,
}

#[derive(Debug, Default)]
struct Faults {
    /// Writes here fail until cleared
    locations: HashSet<Location>,
    /// Writes left before the next one fails, once
    countdown: Option<usize>,
}

impl Faults {
    fn trip(&mut self, location: Location) -> bool {
        if self.locations.contains(&location) {
            return true;
        }
        match self.countdown {
            Some(0) => {
                self.countdown = None;
                true
            }
            Some(n) => {
                self.countdown = Some(n - 1);
                false
            }
            None => false,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FaultyDatastoreError {
    #[error("injected write failure at {0}")]
    Injected(Location),
    #[error("fault table error: {0}")]
    Internal(String),
    #[error(transparent)]
    Memory(#[from] MemoryDatastoreError),
}

impl FaultyDatastore {
    pub fn new(inner: MemoryDatastore) -> Self {
        Self {
            inner,
            faults: Arc::default(),
        }
    }

    /// The wrapped datastore, for inspecting or tampering with its state
    pub fn inner(&self) -> &MemoryDatastore {
        &self.inner
    }

    /// Fail every write (put or delete) at `location` until [`clear`](Self::clear).
    pub fn fail_writes_at(&self, location: Location) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.locations.insert(location);
        }
    }

    /// Let `n` writes through, then fail the next one.
    pub fn fail_after_writes(&self, n: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.countdown = Some(n);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            *faults = Faults::default();
        }
    }

    fn check(&self, location: Location) -> Result<(), DatastoreError<FaultyDatastoreError>> {
        let mut faults = self.faults.lock().map_err(|e| {
            DatastoreError::Provider(FaultyDatastoreError::Internal(format!(
                "failed to acquire fault lock: {}",
                e
            )))
        })?;
        if faults.trip(location) {
            tracing::debug!("injecting write failure at {}", location);
            return Err(DatastoreError::Provider(FaultyDatastoreError::Injected(
                location,
            )));
        }
        Ok(())
    }
}

fn lift(e: DatastoreError<MemoryDatastoreError>) -> DatastoreError<FaultyDatastoreError> {
    match e {
        DatastoreError::Provider(e) => DatastoreError::Provider(e.into()),
    }
}

#[async_trait]
impl Datastore for FaultyDatastore {
    type Error = FaultyDatastoreError;

    async fn put(&self, location: Location, data: Bytes) -> Result<(), DatastoreError<Self::Error>> {
        self.check(location)?;
        self.inner.put(location, data).await.map_err(lift)
    }

    async fn get(&self, location: Location) -> Result<Option<Bytes>, DatastoreError<Self::Error>> {
        self.inner.get(location).await.map_err(lift)
    }

    async fn delete(&self, location: Location) -> Result<(), DatastoreError<Self::Error>> {
        self.check(location)?;
        self.inner.delete(location).await.map_err(lift)
    }

    async fn exists(&self, location: Location) -> Result<bool, DatastoreError<Self::Error>> {
        self.inner.exists(location).await.map_err(lift)
    }
}
