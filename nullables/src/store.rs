//! Nullable record store: thread-safe in-memory storage for testing.

use shield_store::{RecordKey, RecordStore, StoreError, VersionedRecord, WriteBatch};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory [`RecordStore`] with the same atomic compare-and-swap commit
/// semantics a real backend must provide.
///
/// A single mutex serializes commits, which is exactly the per-record
/// serialization the host ledger guarantees.
#[derive(Default)]
pub struct NullRecordStore {
    records: Mutex<HashMap<RecordKey, VersionedRecord>>,
    /// Remaining commits to reject with a synthetic conflict.
    injected_conflicts: AtomicUsize,
    commits: AtomicUsize,
}

impl NullRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` commits fail with `StoreError::Conflict` without
    /// applying anything.
    pub fn inject_conflicts(&self, n: usize) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    /// Number of successfully applied batches.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of live (non-deleted) records.
    pub fn record_count(&self) -> usize {
        self.lock()
            .map(|r| r.values().filter(|v| v.bytes.is_some()).count())
            .unwrap_or(0)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<RecordKey, VersionedRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("record store mutex poisoned".into()))
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl RecordStore for NullRecordStore {
    fn get(&self, key: &RecordKey) -> Result<Option<VersionedRecord>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        if self.take_injected_conflict() {
            return Err(StoreError::Conflict {
                key: "<injected>".into(),
                expected: 0,
                found: 0,
            });
        }
        for (key, expected) in batch.expectations() {
            let found = records.get(key).map_or(0, |r| r.version);
            if found != expected {
                return Err(StoreError::Conflict {
                    key: key.to_string(),
                    expected,
                    found,
                });
            }
        }
        for write in batch.writes {
            let version = records.get(&write.key).map_or(0, |r| r.version) + 1;
            records.insert(
                write.key,
                VersionedRecord {
                    version,
                    bytes: write.value,
                },
            );
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
