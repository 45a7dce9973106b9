//! Optimistic transactions over a [`RecordStore`].
//!
//! A transaction remembers the version of every record it reads and stages
//! every write in memory. Nothing reaches the backend until [`Transaction::commit`],
//! which hands the backend one batch to validate and apply atomically. Dropping
//! a transaction discards its writes.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::batch::{PendingWrite, ReadCheck, WriteBatch};
use crate::key::{RecordKey, Sequence};
use crate::record::RecordStore;
use crate::StoreError;

pub struct Transaction<'s> {
    store: &'s dyn RecordStore,
    /// Records read from the backend: key → (version, bytes).
    observed: BTreeMap<RecordKey, (u64, Option<Vec<u8>>)>,
    /// Staged writes: key → new bytes (`None` = delete).
    staged: BTreeMap<RecordKey, Option<Vec<u8>>>,
}

impl<'s> Transaction<'s> {
    pub fn begin(store: &'s dyn RecordStore) -> Self {
        Self {
            store,
            observed: BTreeMap::new(),
            staged: BTreeMap::new(),
        }
    }

    /// Load a record from the backend once, remembering its version.
    fn observe(&mut self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some((_, bytes)) = self.observed.get(key) {
            return Ok(bytes.clone());
        }
        let (version, bytes) = match self.store.get(key)? {
            Some(record) => (record.version, record.bytes),
            None => (0, None),
        };
        self.observed.insert(key.clone(), (version, bytes.clone()));
        Ok(bytes)
    }

    fn current_bytes(&mut self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        match self.staged.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.observe(key),
        }
    }

    /// Read and decode a record, seeing this transaction's own staged writes.
    pub fn get<T: DeserializeOwned>(&mut self, key: &RecordKey) -> Result<Option<T>, StoreError> {
        match self.current_bytes(key)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get) but a missing record is `StoreError::NotFound`.
    pub fn get_required<T: DeserializeOwned>(&mut self, key: &RecordKey) -> Result<T, StoreError> {
        self.get(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub fn exists(&mut self, key: &RecordKey) -> Result<bool, StoreError> {
        Ok(self.current_bytes(key)?.is_some())
    }

    /// Stage a write.
    pub fn put<T: Serialize>(&mut self, key: RecordKey, value: &T) -> Result<(), StoreError> {
        self.observe(&key)?;
        let bytes = bincode::serialize(value)
            .map_err(|e| StoreError::Serialization(format!("{key}: {e}")))?;
        self.staged.insert(key, Some(bytes));
        Ok(())
    }

    /// Stage a write that must create the record.
    pub fn insert_once<T: Serialize>(
        &mut self,
        key: RecordKey,
        value: &T,
    ) -> Result<(), StoreError> {
        if self.exists(&key)? {
            return Err(StoreError::Duplicate(key.to_string()));
        }
        self.put(key, value)
    }

    /// Stage a delete.
    pub fn delete(&mut self, key: RecordKey) -> Result<(), StoreError> {
        self.observe(&key)?;
        self.staged.insert(key, None);
        Ok(())
    }

    /// Allocate the next id of a sequence. Ids start at 1.
    pub fn next_id(&mut self, sequence: Sequence) -> Result<u64, StoreError> {
        let key = RecordKey::Sequence(sequence);
        let current: u64 = self.get(&key)?.unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::SequenceExhausted(format!("{sequence:?}")))?;
        self.put(key, &next)?;
        Ok(next)
    }

    /// Whether any write has been staged.
    pub fn has_writes(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Turn the staged state into a batch for the backend.
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::default();
        for (key, (version, _)) in &self.observed {
            if !self.staged.contains_key(key) {
                batch.checks.push(ReadCheck {
                    key: key.clone(),
                    expected_version: *version,
                });
            }
        }
        for (key, value) in self.staged {
            let expected_version = self.observed.get(&key).map_or(0, |(v, _)| *v);
            batch.writes.push(PendingWrite {
                key,
                expected_version,
                value,
            });
        }
        batch
    }

    /// Hand the batch to the backend. A read-only transaction commits nothing.
    pub fn commit(self) -> Result<(), StoreError> {
        let store = self.store;
        let batch = self.into_batch();
        if batch.is_empty() {
            return Ok(());
        }
        store.commit(batch)
    }
}
