//! Settlement events for subscribers and the append-only event log.
//!
//! Events are produced inside an operation but published only after its
//! transaction commits, so observers never see an effect that was rolled back.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use shield_settlement::SplitShare;
use shield_store::StoreError;
use shield_types::{
    Address, Amount, ProgramId, ProposalId, ReportId, Severity, Timestamp, VoteId,
};

/// Settlement-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformEvent {
    /// A triage vote was opened for a report.
    VoteCreated {
        vote: VoteId,
        report: ReportId,
        program: ProgramId,
        creator: Address,
        deadline: Timestamp,
        urgent: bool,
        premium: Amount,
        at: Timestamp,
    },
    /// A voter staked on a severity.
    VoteCast {
        vote: VoteId,
        report: ReportId,
        program: ProgramId,
        voter: Address,
        severity: Severity,
        stake: Amount,
        at: Timestamp,
    },
    /// The vote closed with a decided severity.
    VoteFinalized {
        vote: VoteId,
        report: ReportId,
        program: ProgramId,
        severity: Severity,
        total_staked: Amount,
        at: Timestamp,
    },
    /// A vote stuck below quorum was cancelled.
    VoteCancelled {
        vote: VoteId,
        report: ReportId,
        at: Timestamp,
    },
    /// A majority voter withdrew stake plus reward.
    RewardClaimed {
        vote: VoteId,
        voter: Address,
        amount: Amount,
        at: Timestamp,
    },
    /// A voter withdrew their stake from a cancelled vote.
    StakeRefunded {
        vote: VoteId,
        voter: Address,
        amount: Amount,
        at: Timestamp,
    },
    /// The leftover reward pool left the vote.
    ResidualSwept {
        vote: VoteId,
        recipient: Address,
        amount: Amount,
        at: Timestamp,
    },
    /// A report was paid to its researcher.
    PayoutExecuted {
        report: ReportId,
        program: ProgramId,
        recipient: Address,
        severity: Severity,
        amount: Amount,
        fee_refund: Amount,
        at: Timestamp,
    },
    SplitProposed {
        proposal: ProposalId,
        report: ReportId,
        program: ProgramId,
        total_amount: Amount,
        recipients: usize,
        at: Timestamp,
    },
    SplitApproved {
        proposal: ProposalId,
        report: ReportId,
        program: ProgramId,
        approver: Address,
        share_bps: u32,
        total_amount: Amount,
        all_approved: bool,
        at: Timestamp,
    },
    /// A split paid out; `transfers` is in proposal order.
    SplitExecuted {
        proposal: ProposalId,
        report: ReportId,
        program: ProgramId,
        severity: Severity,
        total_amount: Amount,
        transfers: Vec<SplitShare>,
        dust: Amount,
        fee_recipient: Address,
        fee_refund: Amount,
        at: Timestamp,
    },
    SplitCancelled {
        proposal: ProposalId,
        report: ReportId,
        at: Timestamp,
    },
}

impl PlatformEvent {
    pub fn at(&self) -> Timestamp {
        match self {
            PlatformEvent::VoteCreated { at, .. }
            | PlatformEvent::VoteCast { at, .. }
            | PlatformEvent::VoteFinalized { at, .. }
            | PlatformEvent::VoteCancelled { at, .. }
            | PlatformEvent::RewardClaimed { at, .. }
            | PlatformEvent::StakeRefunded { at, .. }
            | PlatformEvent::ResidualSwept { at, .. }
            | PlatformEvent::PayoutExecuted { at, .. }
            | PlatformEvent::SplitProposed { at, .. }
            | PlatformEvent::SplitApproved { at, .. }
            | PlatformEvent::SplitExecuted { at, .. }
            | PlatformEvent::SplitCancelled { at, .. } => *at,
        }
    }
}

/// Synchronous fan-out event bus for settlement events.
///
/// Listeners are invoked inline on the committing thread; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&PlatformEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&PlatformEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &PlatformEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// An event with its position in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Starts at 1, strictly increasing, no gaps.
    pub seq: u64,
    pub event: PlatformEvent,
}

/// Append-only, in-process log of committed events.
#[derive(Default)]
pub struct EventLog {
    entries: Mutex<Vec<LoggedEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<LoggedEvent>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("event log mutex poisoned".into()))
    }

    /// Run `commit` and, if it succeeds, append `events`.
    ///
    /// The log lock is held across the commit so sequence numbers follow
    /// commit order.
    pub fn commit_with<F>(
        &self,
        commit: F,
        events: Vec<PlatformEvent>,
    ) -> Result<Vec<LoggedEvent>, StoreError>
    where
        F: FnOnce() -> Result<(), StoreError>,
    {
        let mut entries = self.lock()?;
        commit()?;
        let mut next = entries.last().map_or(1, |e| e.seq + 1);
        let mut appended = Vec::with_capacity(events.len());
        for event in events {
            let logged = LoggedEvent { seq: next, event };
            next += 1;
            entries.push(logged.clone());
            appended.push(logged);
        }
        Ok(appended)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every logged event with `seq > after`.
    pub fn since(&self, after: u64) -> Vec<LoggedEvent> {
        self.lock()
            .map(|e| e.iter().filter(|l| l.seq > after).cloned().collect())
            .unwrap_or_default()
    }

    pub fn all(&self) -> Vec<LoggedEvent> {
        self.since(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn cancelled(n: u64) -> PlatformEvent {
        PlatformEvent::VoteCancelled {
            vote: VoteId::new(n),
            report: ReportId::new(n),
            at: Timestamp::new(n),
        }
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&cancelled(1));
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        EventBus::default().emit(&cancelled(1));
    }

    #[test]
    fn sequence_numbers_continue_across_commits() {
        let log = EventLog::new();
        log.commit_with(|| Ok(()), vec![cancelled(1), cancelled(2)])
            .unwrap();
        let appended = log.commit_with(|| Ok(()), vec![cancelled(3)]).unwrap();
        assert_eq!(appended[0].seq, 3);
        assert_eq!(log.len(), 3);
        assert_eq!(log.since(1).len(), 2);
        assert_eq!(log.all()[0].event.at(), Timestamp::new(1));
    }

    #[test]
    fn failed_commit_appends_nothing() {
        let log = EventLog::new();
        let err = log
            .commit_with(
                || Err(StoreError::Backend("down".into())),
                vec![cancelled(1)],
            )
            .unwrap_err();
        assert_eq!(err, StoreError::Backend("down".into()));
        assert!(log.is_empty());
    }
}
