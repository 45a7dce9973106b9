//! The triage vote: the unit of voting state.
//!
//! Lifecycle: created `Active` with a deadline; voters cast once each until
//! the deadline; after the deadline and with quorum met it finalizes to the
//! leading severity (terminal). A vote that never reaches quorum may be
//! cancelled by its creator once the stale grace period has elapsed (also
//! terminal). Votes are never deleted; they are kept for claims.

use crate::error::TriageError;
use crate::ledger::StakeLedger;
use crate::record::VoteRecord;
use crate::reward::{reward_breakdown, RewardBreakdown};
use serde::{Deserialize, Serialize};
use shield_types::{
    Address, Amount, ProgramId, ReportId, Severity, SettlementParams, Timestamp, VoteId,
};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteStatus {
    /// Accepting stakes until the deadline; awaiting finalization after it.
    Active,
    /// Severity decided. Terminal.
    Finalized,
    /// Never reached quorum and was cancelled by its creator. Terminal.
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageVote {
    pub id: VoteId,
    pub report: ReportId,
    pub program: ProgramId,
    pub creator: Address,
    pub created_at: Timestamp,
    /// Last instant at which a stake may be cast.
    pub deadline: Timestamp,
    pub min_quorum: Amount,
    pub urgent: bool,
    pub premium_paid: Amount,
    /// Slash rate fixed at creation so later parameter changes never affect a live vote.
    pub slash_bps: u32,
    /// After this instant a vote without quorum may be cancelled.
    pub stale_after: Timestamp,
    ledger: StakeLedger,
    status: VoteStatus,
    /// `Severity::None` until finalized.
    final_severity: Severity,
    /// Custody of all stakes plus the premium; claims and refunds draw from it.
    reward_pool: Amount,
}

impl TriageVote {
    /// Open a new vote.
    ///
    /// A non-zero `premium` makes the vote urgent: shorter voting period,
    /// quorum raised by the urgent multiplier, and the premium seeds the
    /// reward pool.
    pub fn open(
        id: VoteId,
        report: ReportId,
        program: ProgramId,
        creator: Address,
        premium: Amount,
        params: &SettlementParams,
        now: Timestamp,
    ) -> Result<Self, TriageError> {
        let urgent = !premium.is_zero();
        let min_premium = u128::from(params.min_urgent_premium);
        if urgent && premium.raw() < min_premium {
            return Err(TriageError::InsufficientPremium {
                have: premium.raw(),
                need: min_premium,
            });
        }
        let base_quorum = u128::from(params.default_min_quorum);
        let (period, min_quorum) = if urgent {
            let quorum = base_quorum
                .checked_mul(u128::from(params.urgent_quorum_multiplier))
                .ok_or(TriageError::Overflow)?;
            (params.urgent_voting_period_secs, quorum)
        } else {
            (params.standard_voting_period_secs, base_quorum)
        };
        let deadline = now.saturating_add(period);

        Ok(Self {
            id,
            report,
            program,
            creator,
            created_at: now,
            deadline,
            min_quorum: Amount::new(min_quorum),
            urgent,
            premium_paid: premium,
            slash_bps: params.slash_bps,
            stale_after: deadline.saturating_add(params.stale_vote_grace_secs),
            ledger: StakeLedger::new(),
            status: VoteStatus::Active,
            final_severity: Severity::None,
            reward_pool: premium,
        })
    }

    pub fn status(&self) -> VoteStatus {
        self.status
    }

    /// The decided severity. Meaningful only once finalized; `Severity::None` before.
    pub fn final_severity(&self) -> Severity {
        self.final_severity
    }

    pub fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    pub fn total_staked(&self) -> Amount {
        self.ledger.total()
    }

    pub fn reward_pool(&self) -> Amount {
        self.reward_pool
    }

    pub fn record_of(&self, voter: &Address) -> Option<&VoteRecord> {
        self.ledger.record_of(voter)
    }

    pub fn quorum_met(&self) -> bool {
        self.ledger.total() >= self.min_quorum
    }

    /// Stake `stake` on severity `choice`. The stake moves into the reward pool.
    pub fn cast(
        &mut self,
        voter: &Address,
        choice: u8,
        stake: Amount,
        now: Timestamp,
    ) -> Result<&VoteRecord, TriageError> {
        if self.status != VoteStatus::Active {
            return Err(TriageError::VoteNotActive);
        }
        if now > self.deadline {
            return Err(TriageError::VotingEnded {
                deadline: self.deadline,
            });
        }
        if self.ledger.record_of(voter).is_some() {
            return Err(TriageError::AlreadyVoted(voter.clone()));
        }
        let severity = Severity::from_u8(choice).ok_or(TriageError::InvalidSeverity(choice))?;
        if stake.is_zero() {
            return Err(TriageError::ZeroStake);
        }
        let pool = self
            .reward_pool
            .checked_add(stake)
            .ok_or(TriageError::Overflow)?;

        self.ledger.record(voter, severity, stake, now)?;
        self.reward_pool = pool;
        debug!(vote = %self.id, %voter, %severity, %stake, "stake cast");
        self.ledger
            .record_of(voter)
            .ok_or_else(|| TriageError::NotVoter(voter.clone()))
    }

    /// The severity that would win if the vote finalized now. Pure preview.
    pub fn winning_severity(&self) -> Severity {
        self.ledger.leading_severity()
    }

    /// Close the vote and fix its severity.
    pub fn finalize(&mut self, now: Timestamp) -> Result<Severity, TriageError> {
        match self.status {
            VoteStatus::Active => {}
            VoteStatus::Finalized => return Err(TriageError::AlreadyFinalized),
            VoteStatus::Cancelled => return Err(TriageError::VoteNotActive),
        }
        if now <= self.deadline {
            return Err(TriageError::VotingNotEnded {
                deadline: self.deadline,
            });
        }
        if !self.quorum_met() {
            return Err(TriageError::QuorumNotMet {
                have: self.ledger.total().raw(),
                need: self.min_quorum.raw(),
            });
        }
        let winner = self.winning_severity();
        self.final_severity = winner;
        self.status = VoteStatus::Finalized;
        debug!(vote = %self.id, severity = %winner, staked = %self.ledger.total(), "vote finalized");
        Ok(winner)
    }

    /// What `voter` could claim right now, broken down.
    pub fn reward_breakdown(
        &self,
        voter: &Address,
    ) -> Result<Option<RewardBreakdown>, TriageError> {
        reward_breakdown(self, voter)
    }

    /// Pay out a majority voter's stake plus reward from the pool. Once per voter.
    pub fn claim_reward(&mut self, voter: &Address) -> Result<Amount, TriageError> {
        if self.status != VoteStatus::Finalized {
            return Err(TriageError::VoteNotFinalized);
        }
        let record = self
            .ledger
            .record_of(voter)
            .ok_or_else(|| TriageError::NotVoter(voter.clone()))?;
        if record.claimed {
            return Err(TriageError::AlreadyClaimed);
        }
        let amount = reward_breakdown(self, voter)?
            .map(|b| b.total)
            .ok_or(TriageError::NothingToClaim)?;
        self.withdraw(voter, amount)?;
        Ok(amount)
    }

    /// Cancel a vote stuck below quorum. Creator only, after the grace period.
    pub fn cancel_stale(&mut self, caller: &Address, now: Timestamp) -> Result<(), TriageError> {
        if *caller != self.creator {
            return Err(TriageError::NotCreator);
        }
        if self.status != VoteStatus::Active {
            return Err(TriageError::VoteNotActive);
        }
        if self.quorum_met() {
            return Err(TriageError::QuorumReached);
        }
        if now <= self.stale_after {
            return Err(TriageError::CancelTooEarly {
                until: self.stale_after,
            });
        }
        self.status = VoteStatus::Cancelled;
        debug!(vote = %self.id, "stale vote cancelled");
        Ok(())
    }

    /// Return a voter's exact stake from a cancelled vote. Once per voter.
    pub fn claim_refund(&mut self, voter: &Address) -> Result<Amount, TriageError> {
        if self.status != VoteStatus::Cancelled {
            return Err(TriageError::VoteNotCancelled);
        }
        let record = self
            .ledger
            .record_of(voter)
            .ok_or_else(|| TriageError::NotVoter(voter.clone()))?;
        if record.claimed {
            return Err(TriageError::AlreadyClaimed);
        }
        let stake = record.stake;
        self.withdraw(voter, stake)?;
        Ok(stake)
    }

    /// Voters who are still owed something.
    pub fn outstanding_claims(&self) -> usize {
        match self.status {
            VoteStatus::Active => self.ledger.voter_count(),
            VoteStatus::Finalized => self
                .ledger
                .records()
                .filter(|r| !r.claimed && r.severity == self.final_severity)
                .count(),
            VoteStatus::Cancelled => self.ledger.records().filter(|r| !r.claimed).count(),
        }
    }

    /// Empty whatever is left in the pool once nobody is owed anything.
    ///
    /// On a finalized vote this is the unredistributed minority stake, the
    /// truncation remainders and the premium; on a cancelled vote it is the
    /// premium. The caller decides where it goes.
    pub fn sweep_residual(&mut self) -> Result<Amount, TriageError> {
        if self.status == VoteStatus::Active {
            return Err(TriageError::VoteNotActive);
        }
        let outstanding = self.outstanding_claims();
        if outstanding > 0 {
            return Err(TriageError::OutstandingClaims(outstanding));
        }
        if self.reward_pool.is_zero() {
            return Err(TriageError::NothingToClaim);
        }
        let residual = self.reward_pool;
        self.reward_pool = Amount::ZERO;
        Ok(residual)
    }

    fn withdraw(&mut self, voter: &Address, amount: Amount) -> Result<(), TriageError> {
        let pool = self
            .reward_pool
            .checked_sub(amount)
            .ok_or(TriageError::PoolExhausted {
                need: amount.raw(),
                have: self.reward_pool.raw(),
            })?;
        let record = self
            .ledger
            .record_mut(voter)
            .ok_or_else(|| TriageError::NotVoter(voter.clone()))?;
        record.mark_claimed()?;
        self.reward_pool = pool;
        Ok(())
    }
}
