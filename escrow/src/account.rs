//! Escrow account: severity tier table plus available balance.

use crate::error::EscrowError;
use serde::{Deserialize, Serialize};
use shield_types::{Amount, Severity, SeverityBuckets};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Payout per severity tier. A zero entry means the tier pays nothing.
    tiers: SeverityBuckets<Amount>,
    balance: Amount,
}

impl EscrowAccount {
    pub fn new(tiers: SeverityBuckets<Amount>) -> Self {
        Self {
            tiers,
            balance: Amount::ZERO,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn tiers(&self) -> &SeverityBuckets<Amount> {
        &self.tiers
    }

    pub fn tier_amount(&self, severity: Severity) -> Amount {
        self.tiers[severity]
    }

    /// Tier amount for `severity`, failing if the tier pays nothing.
    pub fn payout_for(&self, severity: Severity) -> Result<Amount, EscrowError> {
        let amount = self.tier_amount(severity);
        if amount.is_zero() {
            return Err(EscrowError::NoPayoutForTier(severity));
        }
        Ok(amount)
    }

    /// Fail unless `amount` could be debited right now.
    pub fn ensure_available(&self, amount: Amount) -> Result<(), EscrowError> {
        if self.balance < amount {
            return Err(EscrowError::InsufficientEscrow {
                need: amount.raw(),
                have: self.balance.raw(),
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, amount: Amount) -> Result<(), EscrowError> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(EscrowError::InsufficientEscrow {
                need: amount.raw(),
                have: self.balance.raw(),
            })?;
        Ok(())
    }

    pub fn deposit(&mut self, amount: Amount) -> Result<(), EscrowError> {
        if amount.is_zero() {
            return Err(EscrowError::ZeroAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        Ok(())
    }

    pub(crate) fn set_tier(&mut self, severity: Severity, amount: Amount) {
        self.tiers[severity] = amount;
    }
}
