//! The bug report as seen by the settlement core.
//!
//! Intake and validation live elsewhere; the core reads and overwrites the
//! severity, moves the status through a restricted set of transitions,
//! withdraws the submission fee once, and links at most one triage vote and
//! one split proposal.

use crate::error::SettlementError;
use serde::{Deserialize, Serialize};
use shield_types::{Address, Amount, ProgramId, ProposalId, ReportId, Severity, Timestamp, VoteId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Received, not yet decided.
    Submitted,
    /// A triage vote is deciding the severity.
    UnderTriage,
    /// Accepted by the program owner; payable.
    Accepted,
    /// Rejected. Terminal.
    Rejected,
    /// Paid out. Terminal.
    Paid,
}

impl ReportStatus {
    /// The restricted transition set.
    pub fn can_transition_to(self, to: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, to),
            (Submitted, UnderTriage)
                | (Submitted | UnderTriage, Accepted)
                | (Submitted | UnderTriage, Rejected)
                | (Accepted | UnderTriage, Paid)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReport {
    pub id: ReportId,
    pub program: ProgramId,
    pub researcher: Address,
    /// Self-reported at submission; a finalized triage vote may overwrite it.
    pub severity: Severity,
    pub status: ReportStatus,
    /// Fee held in custody since submission, refunded once at settlement.
    pub submission_fee: Amount,
    pub payout_executed: bool,
    pub split_proposal: Option<ProposalId>,
    pub triage_vote: Option<VoteId>,
    pub submitted_at: Timestamp,
    pub paid_at: Option<Timestamp>,
}

impl BugReport {
    pub fn new(
        id: ReportId,
        program: ProgramId,
        researcher: Address,
        severity: Severity,
        submission_fee: Amount,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            program,
            researcher,
            severity,
            status: ReportStatus::Submitted,
            submission_fee,
            payout_executed: false,
            split_proposal: None,
            triage_vote: None,
            submitted_at: now,
            paid_at: None,
        }
    }

    pub fn transition(&mut self, to: ReportStatus) -> Result<(), SettlementError> {
        if !self.status.can_transition_to(to) {
            return Err(SettlementError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Attach a triage vote. A submitted report moves under triage; an
    /// accepted one stays accepted and lets the vote override its severity.
    pub fn link_vote(&mut self, vote: VoteId) -> Result<(), SettlementError> {
        self.ensure_unpaid()?;
        if self.triage_vote.is_some() {
            return Err(SettlementError::VoteAlreadyLinked);
        }
        match self.status {
            ReportStatus::Submitted => self.status = ReportStatus::UnderTriage,
            ReportStatus::Accepted => {}
            found => {
                return Err(SettlementError::InvalidStatus {
                    expected: "Submitted or Accepted",
                    found,
                })
            }
        }
        self.triage_vote = Some(vote);
        Ok(())
    }

    pub fn ensure_unpaid(&self) -> Result<(), SettlementError> {
        if self.payout_executed {
            return Err(SettlementError::PayoutAlreadyExecuted);
        }
        Ok(())
    }

    /// Take the custodied fee. Returns zero on every call after the first.
    pub fn take_fee(&mut self) -> Amount {
        std::mem::replace(&mut self.submission_fee, Amount::ZERO)
    }

    /// Record settlement: status `Paid`, payout flag set, proposal link cleared,
    /// fee withdrawn. Callers have already checked every precondition.
    pub(crate) fn mark_paid(&mut self, now: Timestamp) -> Result<Amount, SettlementError> {
        self.transition(ReportStatus::Paid)?;
        self.payout_executed = true;
        self.split_proposal = None;
        self.paid_at = Some(now);
        Ok(self.take_fee())
    }
}
