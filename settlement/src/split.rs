//! Split settlement: one payout fanned out across several recipients.
//!
//! Protocol: the researcher proposes recipients with basis-point shares
//! summing to 10_000; every recipient approves once; anyone may then execute,
//! which debits escrow once and pays `total × share / 10_000` to each
//! recipient in list order. Truncation remainders ("dust") are debited but
//! paid to nobody. The researcher may cancel any time before execution.

use std::collections::HashSet;

use crate::error::SettlementError;
use crate::report::{BugReport, ReportStatus};
use serde::{Deserialize, Serialize};
use shield_escrow::BountyProgram;
use shield_types::{
    Address, Amount, ProgramId, ProposalId, ReportId, Severity, Timestamp, BPS_DENOMINATOR,
};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRecipient {
    pub address: Address,
    pub share_bps: u32,
    pub approved: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitProposal {
    pub id: ProposalId,
    pub report: ReportId,
    pub program: ProgramId,
    /// The report's researcher; the only one who may cancel, and the fee recipient.
    pub primary: Address,
    pub recipients: Vec<SplitRecipient>,
    /// Tier amount at proposal time; this is what execution debits.
    pub total_amount: Amount,
    pub all_approved: bool,
    pub executed: bool,
    pub created_at: Timestamp,
    pub executed_at: Option<Timestamp>,
}

/// One recipient's slice of an executed split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitShare {
    pub address: Address,
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReceipt {
    pub proposal: ProposalId,
    pub report: ReportId,
    pub program: ProgramId,
    pub severity: Severity,
    pub total_amount: Amount,
    pub shares: Vec<SplitShare>,
    /// `total_amount − Σ shares`; fewer raw units than there are recipients.
    pub dust: Amount,
    pub fee_recipient: Address,
    pub fee_refund: Amount,
    pub executed_at: Timestamp,
}

impl SplitProposal {
    pub fn recipient(&self, address: &Address) -> Option<&SplitRecipient> {
        self.recipients.iter().find(|r| r.address == *address)
    }

    /// Record `caller`'s approval. Returns whether everyone has now approved.
    pub fn approve(&mut self, caller: &Address) -> Result<bool, SettlementError> {
        if self.executed {
            return Err(SettlementError::AlreadyExecuted);
        }
        let recipient = self
            .recipients
            .iter_mut()
            .find(|r| r.address == *caller)
            .ok_or_else(|| SettlementError::NotRecipient(caller.clone()))?;
        if recipient.approved {
            return Err(SettlementError::AlreadyApproved(caller.clone()));
        }
        recipient.approved = true;
        self.all_approved = self.recipients.iter().all(|r| r.approved);
        debug!(proposal = %self.id, %caller, all_approved = self.all_approved, "split approved");
        Ok(self.all_approved)
    }

    pub fn approvals(&self) -> usize {
        self.recipients.iter().filter(|r| r.approved).count()
    }
}

fn validate_recipients(
    recipients: &[(Address, u32)],
    max_recipients: usize,
) -> Result<(), SettlementError> {
    if recipients.is_empty() {
        return Err(SettlementError::EmptyRecipients);
    }
    if recipients.len() > max_recipients {
        return Err(SettlementError::TooManyRecipients {
            max: max_recipients,
            got: recipients.len(),
        });
    }
    let mut seen = HashSet::new();
    let mut total: u64 = 0;
    for (address, share) in recipients {
        if *share == 0 {
            return Err(SettlementError::ZeroShare(address.clone()));
        }
        if !seen.insert(address) {
            return Err(SettlementError::DuplicateRecipient(address.clone()));
        }
        total += *share as u64;
    }
    if total != BPS_DENOMINATOR as u64 {
        return Err(SettlementError::InvalidShares { total });
    }
    Ok(())
}

/// Propose splitting an accepted report's payout.
///
/// The amount is the escrow tier for the report's current severity; it is
/// fixed here and not re-read at execution.
pub fn propose_split(
    id: ProposalId,
    report: &mut BugReport,
    program: &BountyProgram,
    caller: &Address,
    recipients: Vec<(Address, u32)>,
    max_recipients: usize,
    now: Timestamp,
) -> Result<SplitProposal, SettlementError> {
    if *caller != report.researcher {
        return Err(SettlementError::NotResearcher);
    }
    report.ensure_unpaid()?;
    if report.status != ReportStatus::Accepted {
        return Err(SettlementError::InvalidStatus {
            expected: "Accepted",
            found: report.status,
        });
    }
    if report.split_proposal.is_some() {
        return Err(SettlementError::SplitProposalExists);
    }
    if report.program != program.id {
        return Err(SettlementError::ProgramMismatch);
    }
    validate_recipients(&recipients, max_recipients)?;
    let total_amount = program.escrow.payout_for(report.severity)?;

    report.split_proposal = Some(id);
    Ok(SplitProposal {
        id,
        report: report.id,
        program: program.id,
        primary: report.researcher.clone(),
        recipients: recipients
            .into_iter()
            .map(|(address, share_bps)| SplitRecipient {
                address,
                share_bps,
                approved: false,
            })
            .collect(),
        total_amount,
        all_approved: false,
        executed: false,
        created_at: now,
        executed_at: None,
    })
}

/// Per-recipient amounts in list order, plus the undistributed dust.
pub fn split_amounts(
    total: Amount,
    recipients: &[SplitRecipient],
) -> Result<(Vec<SplitShare>, Amount), SettlementError> {
    let mut shares = Vec::with_capacity(recipients.len());
    let mut distributed = Amount::ZERO;
    for r in recipients {
        let amount = total
            .checked_mul_div(r.share_bps as u128, BPS_DENOMINATOR)
            .ok_or(SettlementError::Overflow)?;
        distributed = distributed
            .checked_add(amount)
            .ok_or(SettlementError::Overflow)?;
        shares.push(SplitShare {
            address: r.address.clone(),
            amount,
        });
    }
    let dust = total
        .checked_sub(distributed)
        .ok_or(SettlementError::Overflow)?;
    Ok((shares, dust))
}

/// Execute a fully approved split: one escrow debit, many credits.
///
/// The submission fee goes back to the primary researcher only.
pub fn execute_split(
    proposal: &mut SplitProposal,
    report: &mut BugReport,
    program: &mut BountyProgram,
    now: Timestamp,
) -> Result<SplitReceipt, SettlementError> {
    if proposal.executed {
        return Err(SettlementError::AlreadyExecuted);
    }
    if !proposal.all_approved {
        return Err(SettlementError::NotAllApproved);
    }
    report.ensure_unpaid()?;
    if report.split_proposal != Some(proposal.id) || proposal.report != report.id {
        return Err(SettlementError::NoSplitProposal);
    }
    if report.program != program.id || proposal.program != program.id {
        return Err(SettlementError::ProgramMismatch);
    }
    if !report.status.can_transition_to(ReportStatus::Paid) {
        return Err(SettlementError::InvalidTransition {
            from: report.status,
            to: ReportStatus::Paid,
        });
    }
    program.escrow.ensure_available(proposal.total_amount)?;
    let (shares, dust) = split_amounts(proposal.total_amount, &proposal.recipients)?;

    program.settle(proposal.total_amount)?;
    let fee_refund = report.mark_paid(now)?;
    proposal.executed = true;
    proposal.executed_at = Some(now);
    debug!(
        proposal = %proposal.id,
        report = %report.id,
        total = %proposal.total_amount,
        %dust,
        "split executed"
    );

    Ok(SplitReceipt {
        proposal: proposal.id,
        report: report.id,
        program: program.id,
        severity: report.severity,
        total_amount: proposal.total_amount,
        shares,
        dust,
        fee_recipient: proposal.primary.clone(),
        fee_refund,
        executed_at: now,
    })
}

/// Withdraw an unexecuted proposal. Nothing was debited, so nothing moves.
pub fn cancel_split(
    proposal: &SplitProposal,
    report: &mut BugReport,
    caller: &Address,
) -> Result<(), SettlementError> {
    if *caller != proposal.primary {
        return Err(SettlementError::NotResearcher);
    }
    if proposal.executed {
        return Err(SettlementError::AlreadyExecuted);
    }
    if report.split_proposal != Some(proposal.id) {
        return Err(SettlementError::NoSplitProposal);
    }
    report.split_proposal = None;
    Ok(())
}
