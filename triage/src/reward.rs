//! Slashing & reward calculator.
//!
//! For a finalized vote, a majority voter (one who chose the final severity)
//! is owed their own stake back plus a pro-rata slice of the slashed pool:
//!
//! ```text
//! minority = total_staked − winning_bucket
//! slash    = minority × slash_bps / 10_000        (10% by default)
//! reward   = voter_stake × slash / winning_bucket
//! payable  = voter_stake + reward
//! ```
//!
//! Minority voters are owed nothing: their stake stays in the reward pool.
//! Only the slashed fraction is redistributed; the rest of the minority stake
//! remains in the pool until it is swept (see [`TriageVote::sweep_residual`]).
//! All divisions truncate.
//!
//! [`TriageVote::sweep_residual`]: crate::TriageVote::sweep_residual

use crate::error::TriageError;
use crate::vote::{TriageVote, VoteStatus};
use serde::{Deserialize, Serialize};
use shield_types::{Address, Amount};

/// The parts of a majority voter's payout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// The voter's own stake, returned.
    pub stake: Amount,
    /// The whole slashed pool shared by the majority.
    pub slash_pool: Amount,
    /// This voter's slice of the slashed pool.
    pub reward: Amount,
    /// `stake + reward`.
    pub total: Amount,
}

/// Slashed portion of the minority stake.
pub fn slash_amount(minority_stake: Amount, slash_bps: u32) -> Option<Amount> {
    minority_stake.apply_bps(slash_bps)
}

/// Compute what `voter` may claim, or `None` when nothing is owed: the vote
/// is not finalized, the voter never voted, already claimed, or backed a
/// non-winning severity.
pub fn reward_breakdown(
    vote: &TriageVote,
    voter: &Address,
) -> Result<Option<RewardBreakdown>, TriageError> {
    if vote.status() != VoteStatus::Finalized {
        return Ok(None);
    }
    let Some(record) = vote.ledger().record_of(voter) else {
        return Ok(None);
    };
    if record.claimed || record.severity != vote.final_severity() {
        return Ok(None);
    }

    let winning = vote.ledger().stake_for(vote.final_severity());
    let minority = vote
        .ledger()
        .total()
        .checked_sub(winning)
        .ok_or(TriageError::Overflow)?;
    let slash_pool = slash_amount(minority, vote.slash_bps).ok_or(TriageError::Overflow)?;
    let reward = if winning.is_zero() {
        Amount::ZERO
    } else {
        record
            .stake
            .checked_mul_div(slash_pool.raw(), winning.raw())
            .ok_or(TriageError::Overflow)?
    };
    let total = record
        .stake
        .checked_add(reward)
        .ok_or(TriageError::Overflow)?;

    Ok(Some(RewardBreakdown {
        stake: record.stake,
        slash_pool,
        reward,
        total,
    }))
}

/// Claimable amount for `voter`; zero whenever [`reward_breakdown`] owes nothing.
///
/// Arithmetic failures are returned rather than reported as a zero claim.
pub fn calculate_voter_reward(vote: &TriageVote, voter: &Address) -> Result<Amount, TriageError> {
    Ok(reward_breakdown(vote, voter)?.map_or(Amount::ZERO, |breakdown| breakdown.total))
}
