//! Per-voter participation records.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use shield_types::{Address, Amount, Severity, Timestamp};

/// One voter's participation in a triage vote.
///
/// Immutable once cast except `claimed`, which flips exactly once (on reward
/// claim for a finalized vote, or on refund for a cancelled one).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: Address,
    pub severity: Severity,
    pub stake: Amount,
    pub cast_at: Timestamp,
    pub claimed: bool,
}

impl VoteRecord {
    pub fn new(voter: Address, severity: Severity, stake: Amount, cast_at: Timestamp) -> Self {
        Self {
            voter,
            severity,
            stake,
            cast_at,
            claimed: false,
        }
    }

    pub(crate) fn mark_claimed(&mut self) -> Result<(), TriageError> {
        if self.claimed {
            return Err(TriageError::AlreadyClaimed);
        }
        self.claimed = true;
        Ok(())
    }
}
