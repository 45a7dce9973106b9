//! Stake ledger: per-voter stakes and cumulative stake per severity bucket.
//!
//! Invariant: `total == Σ per_severity`, and every voter has at most one record.
//! Both are maintained by [`StakeLedger::record`], the only mutation that adds stake.

use std::collections::BTreeMap;

use crate::error::TriageError;
use crate::record::VoteRecord;
use serde::{Deserialize, Serialize};
use shield_types::{Address, Amount, Severity, SeverityBuckets, Timestamp};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeLedger {
    per_severity: SeverityBuckets<Amount>,
    total: Amount,
    /// Ordered by voter address so iteration is deterministic.
    records: BTreeMap<Address, VoteRecord>,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new stake. Nothing changes if the voter already has a record
    /// or the totals would overflow.
    pub fn record(
        &mut self,
        voter: &Address,
        severity: Severity,
        stake: Amount,
        now: Timestamp,
    ) -> Result<&VoteRecord, TriageError> {
        if self.records.contains_key(voter) {
            return Err(TriageError::AlreadyVoted(voter.clone()));
        }
        let bucket = self.per_severity[severity]
            .checked_add(stake)
            .ok_or(TriageError::Overflow)?;
        let total = self.total.checked_add(stake).ok_or(TriageError::Overflow)?;

        self.per_severity[severity] = bucket;
        self.total = total;
        let record = self
            .records
            .entry(voter.clone())
            .or_insert_with(|| VoteRecord::new(voter.clone(), severity, stake, now));
        Ok(&*record)
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn stake_for(&self, severity: Severity) -> Amount {
        self.per_severity[severity]
    }

    pub fn buckets(&self) -> &SeverityBuckets<Amount> {
        &self.per_severity
    }

    pub fn record_of(&self, voter: &Address) -> Option<&VoteRecord> {
        self.records.get(voter)
    }

    pub(crate) fn record_mut(&mut self, voter: &Address) -> Option<&mut VoteRecord> {
        self.records.get_mut(voter)
    }

    pub fn records(&self) -> impl Iterator<Item = &VoteRecord> {
        self.records.values()
    }

    pub fn voter_count(&self) -> usize {
        self.records.len()
    }

    /// The bucket with the strictly greatest stake, scanning None → Critical.
    ///
    /// The first bucket reaching the maximum wins, so exact ties resolve to the
    /// lower severity. An empty ledger yields `Severity::None`.
    pub fn leading_severity(&self) -> Severity {
        let mut leader = Severity::None;
        let mut max = Amount::ZERO;
        for (severity, stake) in self.per_severity.iter() {
            if stake > max {
                max = stake;
                leader = severity;
            }
        }
        leader
    }

    /// Check the sum invariant. Used by tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        let bucket_sum = self
            .per_severity
            .iter()
            .try_fold(Amount::ZERO, |acc, (_, s)| acc.checked_add(s));
        let record_sum = self
            .records
            .values()
            .try_fold(Amount::ZERO, |acc, r| acc.checked_add(r.stake));
        bucket_sum == Some(self.total) && record_sum == Some(self.total)
    }
}
