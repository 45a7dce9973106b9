//! The record store trait.

use crate::batch::WriteBatch;
use crate::key::RecordKey;
use crate::StoreError;

/// A record as held by the backend.
///
/// `version` starts at 1 on the first write and increments on every write,
/// deletes included. A deleted record keeps its version as a tombstone
/// (`bytes == None`) so an absent key can never be mistaken for one that
/// was deleted and re-created. Version 0 means "never written".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedRecord {
    pub version: u64,
    pub bytes: Option<Vec<u8>>,
}

/// Trait every storage backend implements.
///
/// Implementations must make `commit` atomic and serializable: either every
/// check and write in the batch matches the current versions and all writes
/// are applied together, or nothing changes and `StoreError::Conflict` is
/// returned.
pub trait RecordStore: Send + Sync {
    /// Read the current version of a record. `None` if it was never written.
    fn get(&self, key: &RecordKey) -> Result<Option<VersionedRecord>, StoreError>;

    /// Atomically validate and apply a batch.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn get(&self, key: &RecordKey) -> Result<Option<VersionedRecord>, StoreError> {
        (**self).get(key)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).commit(batch)
    }
}
