//! The platform: every core operation as one optimistic transaction.
//!
//! Each public operation loads the records it needs, runs the domain logic on
//! in-memory copies, stages the writes and commits them as one batch. A
//! failed precondition returns before commit, so nothing is written. On a
//! write conflict the whole operation re-runs against fresh state; the loser
//! of a race therefore sees the winner's effect and fails with the domain
//! error (`AlreadyFinalized`, `PayoutAlreadyExecuted`, ...).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use shield_escrow::BountyProgram;
use shield_settlement::{
    self as settlement, BugReport, PayoutReceipt, ReportStatus, SplitProposal, SplitReceipt,
};
use shield_store::{RecordKey, RecordStore, Sequence, StoreError, Transaction};
use shield_triage::{calculate_voter_reward, RewardBreakdown, TriageVote, VoteStatus};
use shield_types::{
    Address, Amount, Clock, ProgramId, ProposalId, ReportId, Severity, SeverityBuckets,
    Timestamp, VoteId,
};
use tracing::{debug, info, warn};

use crate::balances;
use crate::config::PlatformConfig;
use crate::events::{EventBus, EventLog, PlatformEvent};
use crate::registry;
use crate::PlatformError;

type Staged<T> = Result<(T, Vec<PlatformEvent>), PlatformError>;

pub struct Platform<S: RecordStore> {
    store: S,
    clock: Arc<dyn Clock>,
    config: PlatformConfig,
    bus: EventBus,
    log: EventLog,
}

fn load<T: DeserializeOwned>(txn: &mut Transaction<'_>, key: RecordKey) -> Result<T, PlatformError> {
    txn.get(&key)?
        .ok_or_else(|| PlatformError::NotFound(key.to_string()))
}

impl<S: RecordStore> Platform<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, config: PlatformConfig) -> Result<Self, PlatformError> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
            bus: EventBus::new(),
            log: EventLog::new(),
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &EventLog {
        &self.log
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&PlatformEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    /// Run `op` in a fresh transaction until it commits, fails, or keeps
    /// conflicting past `max_commit_retries`. Events are published after commit.
    fn transact<T, F>(&self, operation: &'static str, mut op: F) -> Result<T, PlatformError>
    where
        F: FnMut(&mut Transaction<'_>, Timestamp) -> Staged<T>,
    {
        let mut conflicts = 0u32;
        loop {
            let now = self.clock.now();
            let mut txn = Transaction::begin(&self.store);
            let (value, events) = op(&mut txn, now)?;
            match self.log.commit_with(|| txn.commit(), events) {
                Ok(logged) => {
                    for entry in &logged {
                        self.bus.emit(&entry.event);
                    }
                    return Ok(value);
                }
                Err(StoreError::Conflict { key, .. }) => {
                    conflicts += 1;
                    if conflicts > self.config.max_commit_retries {
                        return Err(PlatformError::CommitRetriesExhausted {
                            operation,
                            attempts: conflicts,
                        });
                    }
                    warn!(operation, %key, attempt = conflicts, "write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read-only access at the store's current state.
    fn view<T>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, PlatformError>,
    ) -> Result<T, PlatformError> {
        let mut txn = Transaction::begin(&self.store);
        f(&mut txn)
    }

    // ── Balance book ───────────────────────────────────────────────────

    /// Credit host funds to `who`. Returns the new balance.
    pub fn deposit(&self, who: &Address, amount: Amount) -> Result<Amount, PlatformError> {
        if amount.is_zero() {
            return Err(PlatformError::ZeroAmount);
        }
        self.transact("deposit", |txn, _| {
            Ok((balances::credit(txn, who, amount)?, Vec::new()))
        })
    }

    pub fn balance_of(&self, who: &Address) -> Result<Amount, PlatformError> {
        self.view(|txn| balances::balance(txn, who))
    }

    // ── Programs ───────────────────────────────────────────────────────

    pub fn register_program(
        &self,
        owner: &Address,
        tiers: SeverityBuckets<Amount>,
    ) -> Result<ProgramId, PlatformError> {
        self.transact("register_program", |txn, now| {
            let id = ProgramId::new(txn.next_id(Sequence::Programs)?);
            let program = BountyProgram::new(id, owner.clone(), tiers, now);
            txn.insert_once(RecordKey::Program(id), &program)?;
            info!(program = %id, %owner, "program registered");
            Ok((id, Vec::new()))
        })
    }

    /// Move `amount` from `from`'s balance into the program's escrow.
    pub fn fund_escrow(
        &self,
        program: ProgramId,
        from: &Address,
        amount: Amount,
    ) -> Result<Amount, PlatformError> {
        self.transact("fund_escrow", |txn, _| {
            let mut p: BountyProgram = load(txn, RecordKey::Program(program))?;
            p.escrow.deposit(amount)?;
            balances::debit(txn, from, amount)?;
            txn.put(RecordKey::Program(program), &p)?;
            debug!(%program, %from, %amount, "escrow funded");
            Ok((p.escrow.balance(), Vec::new()))
        })
    }

    pub fn set_tier(
        &self,
        program: ProgramId,
        caller: &Address,
        severity: Severity,
        amount: Amount,
    ) -> Result<(), PlatformError> {
        self.transact("set_tier", |txn, _| {
            let mut p: BountyProgram = load(txn, RecordKey::Program(program))?;
            p.set_tier(caller, severity, amount)?;
            txn.put(RecordKey::Program(program), &p)?;
            Ok(((), Vec::new()))
        })
    }

    // ── Reports ────────────────────────────────────────────────────────

    /// File a report. The fee moves from the researcher into report custody.
    pub fn submit_report(
        &self,
        program: ProgramId,
        researcher: &Address,
        severity: u8,
        fee: Amount,
    ) -> Result<ReportId, PlatformError> {
        let severity = Severity::try_from(severity)?;
        self.transact("submit_report", |txn, now| {
            let _: BountyProgram = load(txn, RecordKey::Program(program))?;
            balances::debit(txn, researcher, fee)?;
            let id = ReportId::new(txn.next_id(Sequence::Reports)?);
            let report = BugReport::new(id, program, researcher.clone(), severity, fee, now);
            txn.insert_once(RecordKey::Report(id), &report)?;
            debug!(report = %id, %program, %researcher, %severity, "report submitted");
            Ok((id, Vec::new()))
        })
    }

    fn decide_report(
        &self,
        operation: &'static str,
        report: ReportId,
        caller: &Address,
        to: ReportStatus,
    ) -> Result<(), PlatformError> {
        self.transact(operation, |txn, _| {
            let mut r: BugReport = load(txn, RecordKey::Report(report))?;
            let p: BountyProgram = load(txn, RecordKey::Program(r.program))?;
            if *caller != p.owner {
                return Err(PlatformError::Unauthorized(operation));
            }
            r.ensure_unpaid()?;
            r.transition(to)?;
            txn.put(RecordKey::Report(report), &r)?;
            info!(%report, status = ?to, "report decided");
            Ok(((), Vec::new()))
        })
    }

    /// Program owner accepts a report, making it payable.
    pub fn accept_report(&self, report: ReportId, caller: &Address) -> Result<(), PlatformError> {
        self.decide_report("accept_report", report, caller, ReportStatus::Accepted)
    }

    /// Program owner rejects a report. The fee stays in custody.
    pub fn reject_report(&self, report: ReportId, caller: &Address) -> Result<(), PlatformError> {
        self.decide_report("reject_report", report, caller, ReportStatus::Rejected)
    }

    // ── Triage votes ───────────────────────────────────────────────────

    /// Open a triage vote on a report. A non-zero premium, debited from the
    /// creator, makes the vote urgent.
    pub fn create_triage_vote(
        &self,
        report: ReportId,
        creator: &Address,
        premium: Amount,
    ) -> Result<VoteId, PlatformError> {
        self.transact("create_triage_vote", |txn, now| {
            let mut r: BugReport = load(txn, RecordKey::Report(report))?;
            let id = VoteId::new(txn.next_id(Sequence::Votes)?);
            r.link_vote(id)?;
            registry::register(txn, report, id)?;
            let vote = TriageVote::open(
                id,
                report,
                r.program,
                creator.clone(),
                premium,
                &self.config.params,
                now,
            )?;
            balances::debit(txn, creator, premium)?;
            txn.put(RecordKey::Report(report), &r)?;
            txn.insert_once(RecordKey::Vote(id), &vote)?;
            info!(vote = %id, %report, urgent = vote.urgent, deadline = %vote.deadline, "triage vote created");
            let event = PlatformEvent::VoteCreated {
                vote: id,
                report,
                program: r.program,
                creator: creator.clone(),
                deadline: vote.deadline,
                urgent: vote.urgent,
                premium,
                at: now,
            };
            Ok((id, vec![event]))
        })
    }

    /// Stake `stake` from the voter's balance on severity `choice` (0–4).
    pub fn cast_vote(
        &self,
        vote: VoteId,
        voter: &Address,
        choice: u8,
        stake: Amount,
    ) -> Result<(), PlatformError> {
        self.transact("cast_vote", |txn, now| {
            let mut v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            let severity = v.cast(voter, choice, stake, now)?.severity;
            balances::debit(txn, voter, stake)?;
            txn.put(RecordKey::Vote(vote), &v)?;
            let event = PlatformEvent::VoteCast {
                vote,
                report: v.report,
                program: v.program,
                voter: voter.clone(),
                severity,
                stake,
                at: now,
            };
            Ok(((), vec![event]))
        })
    }

    /// Preview of the severity the vote would finalize to now.
    pub fn winning_severity(&self, vote: VoteId) -> Result<Severity, PlatformError> {
        self.view(|txn| Ok(load::<TriageVote>(txn, RecordKey::Vote(vote))?.winning_severity()))
    }

    pub fn finalize_vote(&self, vote: VoteId) -> Result<Severity, PlatformError> {
        self.transact("finalize_vote", |txn, now| {
            let mut v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            let severity = v.finalize(now)?;
            txn.put(RecordKey::Vote(vote), &v)?;
            info!(%vote, %severity, staked = %v.total_staked(), "vote finalized");
            let event = PlatformEvent::VoteFinalized {
                vote,
                report: v.report,
                program: v.program,
                severity,
                total_staked: v.total_staked(),
                at: now,
            };
            Ok((severity, vec![event]))
        })
    }

    /// What `voter` could claim from the vote right now; zero if nothing.
    pub fn voter_reward(&self, vote: VoteId, voter: &Address) -> Result<Amount, PlatformError> {
        self.view(|txn| {
            let v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            Ok(calculate_voter_reward(&v, voter)?)
        })
    }

    pub fn reward_breakdown(
        &self,
        vote: VoteId,
        voter: &Address,
    ) -> Result<Option<RewardBreakdown>, PlatformError> {
        self.view(|txn| {
            let v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            Ok(v.reward_breakdown(voter)?)
        })
    }

    /// Pay a majority voter's stake plus reward into their balance.
    pub fn claim_reward(&self, vote: VoteId, voter: &Address) -> Result<Amount, PlatformError> {
        self.transact("claim_reward", |txn, now| {
            let mut v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            let amount = v.claim_reward(voter)?;
            balances::credit(txn, voter, amount)?;
            txn.put(RecordKey::Vote(vote), &v)?;
            debug!(%vote, %voter, %amount, "reward claimed");
            let event = PlatformEvent::RewardClaimed {
                vote,
                voter: voter.clone(),
                amount,
                at: now,
            };
            Ok((amount, vec![event]))
        })
    }

    pub fn cancel_stale_vote(&self, vote: VoteId, caller: &Address) -> Result<(), PlatformError> {
        self.transact("cancel_stale_vote", |txn, now| {
            let mut v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            v.cancel_stale(caller, now)?;
            txn.put(RecordKey::Vote(vote), &v)?;
            info!(%vote, staked = %v.total_staked(), "stale vote cancelled");
            let event = PlatformEvent::VoteCancelled {
                vote,
                report: v.report,
                at: now,
            };
            Ok(((), vec![event]))
        })
    }

    pub fn claim_refund(&self, vote: VoteId, voter: &Address) -> Result<Amount, PlatformError> {
        self.transact("claim_refund", |txn, now| {
            let mut v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            let amount = v.claim_refund(voter)?;
            balances::credit(txn, voter, amount)?;
            txn.put(RecordKey::Vote(vote), &v)?;
            let event = PlatformEvent::StakeRefunded {
                vote,
                voter: voter.clone(),
                amount,
                at: now,
            };
            Ok((amount, vec![event]))
        })
    }

    /// Empty the vote's leftover pool: to the treasury from a finalized vote,
    /// back to the creator from a cancelled one.
    pub fn sweep_residual(&self, vote: VoteId) -> Result<(Address, Amount), PlatformError> {
        self.transact("sweep_residual", |txn, now| {
            let mut v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            let amount = v.sweep_residual()?;
            let recipient = if v.status() == VoteStatus::Finalized {
                self.config.treasury.clone()
            } else {
                v.creator.clone()
            };
            balances::credit(txn, &recipient, amount)?;
            txn.put(RecordKey::Vote(vote), &v)?;
            info!(%vote, %recipient, %amount, "residual swept");
            let event = PlatformEvent::ResidualSwept {
                vote,
                recipient: recipient.clone(),
                amount,
                at: now,
            };
            Ok(((recipient, amount), vec![event]))
        })
    }

    // ── Settlement ─────────────────────────────────────────────────────

    fn credit_payout(
        txn: &mut Transaction<'_>,
        receipt: &PayoutReceipt,
    ) -> Result<(), PlatformError> {
        let total = receipt
            .amount
            .checked_add(receipt.fee_refund)
            .ok_or(PlatformError::Overflow)?;
        balances::credit(txn, &receipt.recipient, total)?;
        Ok(())
    }

    fn payout_event(receipt: &PayoutReceipt) -> PlatformEvent {
        PlatformEvent::PayoutExecuted {
            report: receipt.report,
            program: receipt.program,
            recipient: receipt.recipient.clone(),
            severity: receipt.severity,
            amount: receipt.amount,
            fee_refund: receipt.fee_refund,
            at: receipt.paid_at,
        }
    }

    /// Pay an accepted report at its current severity.
    pub fn execute_payout(&self, report: ReportId) -> Result<PayoutReceipt, PlatformError> {
        self.transact("execute_payout", |txn, now| {
            let mut r: BugReport = load(txn, RecordKey::Report(report))?;
            let mut p: BountyProgram = load(txn, RecordKey::Program(r.program))?;
            let receipt = settlement::execute_payout(&mut r, &mut p, now)?;
            Self::credit_payout(txn, &receipt)?;
            txn.put(RecordKey::Report(report), &r)?;
            txn.put(RecordKey::Program(p.id), &p)?;
            info!(%report, program = %p.id, amount = %receipt.amount, "payout executed");
            let event = Self::payout_event(&receipt);
            Ok((receipt, vec![event]))
        })
    }

    /// Pay a report at the severity its finalized triage vote decided.
    pub fn execute_payout_with_vote(&self, report: ReportId) -> Result<PayoutReceipt, PlatformError> {
        self.transact("execute_payout_with_vote", |txn, now| {
            let vote = registry::lookup(txn, report)?
                .ok_or_else(|| PlatformError::NotFound(format!("triage vote for {report}")))?;
            let v: TriageVote = load(txn, RecordKey::Vote(vote))?;
            let mut r: BugReport = load(txn, RecordKey::Report(report))?;
            let mut p: BountyProgram = load(txn, RecordKey::Program(r.program))?;
            let receipt = settlement::execute_payout_from_vote(&mut r, &mut p, &v, now)?;
            Self::credit_payout(txn, &receipt)?;
            txn.put(RecordKey::Report(report), &r)?;
            txn.put(RecordKey::Program(p.id), &p)?;
            info!(
                %report,
                %vote,
                severity = %receipt.severity,
                amount = %receipt.amount,
                "payout executed from triage"
            );
            let event = Self::payout_event(&receipt);
            Ok((receipt, vec![event]))
        })
    }

    pub fn propose_split(
        &self,
        report: ReportId,
        caller: &Address,
        recipients: Vec<(Address, u32)>,
    ) -> Result<ProposalId, PlatformError> {
        self.transact("propose_split", |txn, now| {
            let mut r: BugReport = load(txn, RecordKey::Report(report))?;
            let p: BountyProgram = load(txn, RecordKey::Program(r.program))?;
            let id = ProposalId::new(txn.next_id(Sequence::Proposals)?);
            let proposal = settlement::propose_split(
                id,
                &mut r,
                &p,
                caller,
                recipients.clone(),
                self.config.params.max_split_recipients,
                now,
            )?;
            txn.insert_once(RecordKey::Split(id), &proposal)?;
            txn.put(RecordKey::Report(report), &r)?;
            debug!(proposal = %id, %report, total = %proposal.total_amount, "split proposed");
            let event = PlatformEvent::SplitProposed {
                proposal: id,
                report,
                program: p.id,
                total_amount: proposal.total_amount,
                recipients: proposal.recipients.len(),
                at: now,
            };
            Ok((id, vec![event]))
        })
    }

    /// Returns whether every recipient has now approved.
    pub fn approve_split(&self, proposal: ProposalId, caller: &Address) -> Result<bool, PlatformError> {
        self.transact("approve_split", |txn, now| {
            let mut sp: SplitProposal = load(txn, RecordKey::Split(proposal))?;
            let all_approved = sp.approve(caller)?;
            txn.put(RecordKey::Split(proposal), &sp)?;
            let share_bps = sp.recipient(caller).map_or(0, |r| r.share_bps);
            let event = PlatformEvent::SplitApproved {
                proposal,
                report: sp.report,
                program: sp.program,
                approver: caller.clone(),
                share_bps,
                total_amount: sp.total_amount,
                all_approved,
                at: now,
            };
            Ok((all_approved, vec![event]))
        })
    }

    pub fn execute_split(&self, proposal: ProposalId) -> Result<SplitReceipt, PlatformError> {
        self.transact("execute_split", |txn, now| {
            let mut sp: SplitProposal = load(txn, RecordKey::Split(proposal))?;
            let mut r: BugReport = load(txn, RecordKey::Report(sp.report))?;
            let mut p: BountyProgram = load(txn, RecordKey::Program(sp.program))?;
            let receipt = settlement::execute_split(&mut sp, &mut r, &mut p, now)?;
            for share in &receipt.shares {
                balances::credit(txn, &share.address, share.amount)?;
            }
            balances::credit(txn, &receipt.fee_recipient, receipt.fee_refund)?;
            txn.put(RecordKey::Split(proposal), &sp)?;
            txn.put(RecordKey::Report(r.id), &r)?;
            txn.put(RecordKey::Program(p.id), &p)?;
            info!(
                %proposal,
                report = %r.id,
                total = %receipt.total_amount,
                dust = %receipt.dust,
                "split executed"
            );
            let event = PlatformEvent::SplitExecuted {
                proposal,
                report: receipt.report,
                program: receipt.program,
                severity: receipt.severity,
                total_amount: receipt.total_amount,
                transfers: receipt.shares.clone(),
                dust: receipt.dust,
                fee_recipient: receipt.fee_recipient.clone(),
                fee_refund: receipt.fee_refund,
                at: now,
            };
            Ok((receipt, vec![event]))
        })
    }

    /// Withdraw an unexecuted proposal and discard its record.
    pub fn cancel_split(&self, proposal: ProposalId, caller: &Address) -> Result<(), PlatformError> {
        self.transact("cancel_split", |txn, now| {
            let sp: SplitProposal = load(txn, RecordKey::Split(proposal))?;
            let mut r: BugReport = load(txn, RecordKey::Report(sp.report))?;
            settlement::cancel_split(&sp, &mut r, caller)?;
            txn.delete(RecordKey::Split(proposal))?;
            txn.put(RecordKey::Report(r.id), &r)?;
            debug!(%proposal, report = %r.id, "split cancelled");
            let event = PlatformEvent::SplitCancelled {
                proposal,
                report: r.id,
                at: now,
            };
            Ok(((), vec![event]))
        })
    }

    // ── Getters ────────────────────────────────────────────────────────

    pub fn program(&self, id: ProgramId) -> Result<BountyProgram, PlatformError> {
        self.view(|txn| load(txn, RecordKey::Program(id)))
    }

    pub fn report(&self, id: ReportId) -> Result<BugReport, PlatformError> {
        self.view(|txn| load(txn, RecordKey::Report(id)))
    }

    pub fn vote(&self, id: VoteId) -> Result<TriageVote, PlatformError> {
        self.view(|txn| load(txn, RecordKey::Vote(id)))
    }

    pub fn split(&self, id: ProposalId) -> Result<SplitProposal, PlatformError> {
        self.view(|txn| load(txn, RecordKey::Split(id)))
    }

    pub fn vote_for_report(&self, report: ReportId) -> Result<Option<VoteId>, PlatformError> {
        self.view(|txn| registry::lookup(txn, report))
    }
}
