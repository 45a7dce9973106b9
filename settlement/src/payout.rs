//! Single-recipient payout.
//!
//! Direct path: an `Accepted` report is paid the escrow tier amount for its
//! severity. Triage path: a finalized vote's severity overwrites the report's
//! self-reported one before the tier is looked up.

use crate::error::SettlementError;
use crate::report::{BugReport, ReportStatus};
use serde::{Deserialize, Serialize};
use shield_escrow::BountyProgram;
use shield_triage::{TriageVote, VoteStatus};
use shield_types::{Address, Amount, ProgramId, ReportId, Severity, Timestamp};
use tracing::debug;

/// What a payout moved, for the caller to credit and announce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReceipt {
    pub report: ReportId,
    pub program: ProgramId,
    pub recipient: Address,
    pub severity: Severity,
    /// Debited from escrow, credited to the recipient.
    pub amount: Amount,
    /// Submission fee returned to the recipient.
    pub fee_refund: Amount,
    pub paid_at: Timestamp,
}

/// Pay an accepted report from its program's escrow.
pub fn execute_payout(
    report: &mut BugReport,
    program: &mut BountyProgram,
    now: Timestamp,
) -> Result<PayoutReceipt, SettlementError> {
    report.ensure_unpaid()?;
    if report.status != ReportStatus::Accepted {
        return Err(SettlementError::InvalidStatus {
            expected: "Accepted",
            found: report.status,
        });
    }
    let severity = report.severity;
    settle(report, program, severity, now)
}

/// Pay a report at the severity a finalized triage vote decided.
pub fn execute_payout_from_vote(
    report: &mut BugReport,
    program: &mut BountyProgram,
    vote: &TriageVote,
    now: Timestamp,
) -> Result<PayoutReceipt, SettlementError> {
    report.ensure_unpaid()?;
    if vote.status() != VoteStatus::Finalized {
        return Err(SettlementError::VoteNotFinalized);
    }
    if vote.report != report.id || vote.program != report.program {
        return Err(SettlementError::VoteMismatch);
    }
    if !matches!(
        report.status,
        ReportStatus::Accepted | ReportStatus::UnderTriage
    ) {
        return Err(SettlementError::InvalidStatus {
            expected: "Accepted or UnderTriage",
            found: report.status,
        });
    }
    settle(report, program, vote.final_severity(), now)
}

fn settle(
    report: &mut BugReport,
    program: &mut BountyProgram,
    severity: Severity,
    now: Timestamp,
) -> Result<PayoutReceipt, SettlementError> {
    if report.program != program.id {
        return Err(SettlementError::ProgramMismatch);
    }
    if report.split_proposal.is_some() {
        return Err(SettlementError::SplitProposalPending);
    }
    let amount = program.escrow.payout_for(severity)?;
    program.escrow.ensure_available(amount)?;

    program.settle(amount)?;
    report.severity = severity;
    let fee_refund = report.mark_paid(now)?;
    debug!(report = %report.id, %severity, %amount, %fee_refund, "payout settled");

    Ok(PayoutReceipt {
        report: report.id,
        program: program.id,
        recipient: report.researcher.clone(),
        severity,
        amount,
        fee_refund,
        paid_at: now,
    })
}
