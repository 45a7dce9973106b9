//! Bounty program: owner, escrow account and payout aggregates.

use crate::account::EscrowAccount;
use crate::error::EscrowError;
use serde::{Deserialize, Serialize};
use shield_types::{Address, Amount, ProgramId, Severity, SeverityBuckets, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BountyProgram {
    pub id: ProgramId,
    pub owner: Address,
    pub created_at: Timestamp,
    pub escrow: EscrowAccount,
    /// Reports settled through this program.
    pub resolved_reports: u64,
    /// Cumulative amount paid out of escrow.
    pub total_paid: Amount,
}

impl BountyProgram {
    pub fn new(
        id: ProgramId,
        owner: Address,
        tiers: SeverityBuckets<Amount>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            created_at: now,
            escrow: EscrowAccount::new(tiers),
            resolved_reports: 0,
            total_paid: Amount::ZERO,
        }
    }

    /// Change one tier's payout. Owner only.
    pub fn set_tier(
        &mut self,
        caller: &Address,
        severity: Severity,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        if *caller != self.owner {
            return Err(EscrowError::NotOwner);
        }
        self.escrow.set_tier(severity, amount);
        Ok(())
    }

    /// Debit `amount` from escrow and count one more resolved report.
    pub fn settle(&mut self, amount: Amount) -> Result<(), EscrowError> {
        let resolved = self
            .resolved_reports
            .checked_add(1)
            .ok_or(EscrowError::Overflow)?;
        let total_paid = self
            .total_paid
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        self.escrow.debit(amount)?;
        self.resolved_reports = resolved;
        self.total_paid = total_paid;
        Ok(())
    }
}
