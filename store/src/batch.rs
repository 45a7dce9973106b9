//! Write batches: the unit of atomic commit.

use crate::key::RecordKey;

/// A staged write. `value == None` deletes the record.
#[derive(Clone, Debug)]
pub struct PendingWrite {
    pub key: RecordKey,
    /// Version the writer observed (0 = never written).
    pub expected_version: u64,
    pub value: Option<Vec<u8>>,
}

/// A record that was read but not written; its version must be unchanged at
/// commit time for the transaction to be serializable.
#[derive(Clone, Debug)]
pub struct ReadCheck {
    pub key: RecordKey,
    pub expected_version: u64,
}

/// Everything a transaction wants to apply, plus the read set it depends on.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub checks: Vec<ReadCheck>,
    pub writes: Vec<PendingWrite>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Every (key, expected version) pair the backend must validate.
    pub fn expectations(&self) -> impl Iterator<Item = (&RecordKey, u64)> {
        self.checks
            .iter()
            .map(|c| (&c.key, c.expected_version))
            .chain(self.writes.iter().map(|w| (&w.key, w.expected_version)))
    }
}
