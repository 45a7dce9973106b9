//! Integration tests driving the settlement core through `Platform`:
//! program funding → report intake → triage vote → finalize → payout/split
//! → reward claims, over the in-memory record store and a controlled clock.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use shield_nullables::{NullClock, NullRecordStore};
use shield_platform::{Platform, PlatformConfig, PlatformError, PlatformEvent};
use shield_settlement::{ReportStatus, SettlementError};
use shield_triage::{TriageError, VoteStatus};
use shield_types::{Address, Amount, ProgramId, ReportId, Severity, SeverityBuckets};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn addr(name: &str) -> Address {
    Address::new(format!("shd_{name}"))
}

fn tiers() -> SeverityBuckets<Amount> {
    SeverityBuckets::new([
        Amount::ZERO,
        Amount::new(100),
        Amount::new(500),
        Amount::new(1000),
        Amount::new(5000),
    ])
}

struct Harness {
    platform: Platform<NullRecordStore>,
    clock: Arc<NullClock>,
    program: ProgramId,
}

fn harness_with(config: PlatformConfig) -> Harness {
    let clock = Arc::new(NullClock::new(1_700_000_000));
    let platform = Platform::new(NullRecordStore::new(), clock.clone(), config).unwrap();
    let owner = addr("owner");
    platform.deposit(&owner, Amount::new(20_000)).unwrap();
    let program = platform.register_program(&owner, tiers()).unwrap();
    platform
        .fund_escrow(program, &owner, Amount::new(20_000))
        .unwrap();
    Harness {
        platform,
        clock,
        program,
    }
}

fn harness() -> Harness {
    harness_with(PlatformConfig::default())
}

impl Harness {
    /// A report from alice at `severity` with a 10-unit fee.
    fn report(&self, severity: Severity) -> ReportId {
        let alice = addr("alice");
        self.platform.deposit(&alice, Amount::new(10)).unwrap();
        self.platform
            .submit_report(self.program, &alice, severity.as_u8(), Amount::new(10))
            .unwrap()
    }

    fn accepted_report(&self, severity: Severity) -> ReportId {
        let report = self.report(severity);
        self.platform.accept_report(report, &addr("owner")).unwrap();
        report
    }

    fn fund(&self, who: &Address, amount: u128) {
        self.platform.deposit(who, Amount::new(amount)).unwrap();
    }

    fn escrow_balance(&self) -> Amount {
        self.platform.program(self.program).unwrap().escrow.balance()
    }
}

// ---------------------------------------------------------------------------
// Scenario A: stake-weighted vote, slash and reward
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_majority_reward_is_730() {
    let h = harness();
    let report = h.report(Severity::Low);
    let (x, y) = (addr("x"), addr("y"));
    h.fund(&x, 700);
    h.fund(&y, 300);

    let vote = h
        .platform
        .create_triage_vote(report, &addr("creator"), Amount::ZERO)
        .unwrap();
    assert_eq!(h.platform.vote(vote).unwrap().min_quorum, Amount::new(1000));
    h.platform.cast_vote(vote, &x, 3, Amount::new(700)).unwrap();
    h.platform.cast_vote(vote, &y, 4, Amount::new(300)).unwrap();
    assert_eq!(h.platform.balance_of(&x).unwrap(), Amount::ZERO);

    let deadline = h.platform.vote(vote).unwrap().deadline;
    h.clock.advance_past(deadline);
    assert_eq!(h.platform.finalize_vote(vote).unwrap(), Severity::High);

    assert_eq!(h.platform.voter_reward(vote, &x).unwrap(), Amount::new(730));
    assert_eq!(h.platform.voter_reward(vote, &y).unwrap(), Amount::ZERO);
    assert_eq!(h.platform.claim_reward(vote, &x).unwrap(), Amount::new(730));
    assert_eq!(h.platform.balance_of(&x).unwrap(), Amount::new(730));
    assert_eq!(h.platform.voter_reward(vote, &x).unwrap(), Amount::ZERO);
    assert_eq!(
        h.platform.claim_reward(vote, &x),
        Err(PlatformError::Triage(TriageError::AlreadyClaimed))
    );
    assert_eq!(
        h.platform.claim_reward(vote, &y),
        Err(PlatformError::Triage(TriageError::NothingToClaim))
    );

    // 1000 staked − 730 paid stays in the pool and goes to the treasury.
    let (recipient, residual) = h.platform.sweep_residual(vote).unwrap();
    assert_eq!(recipient, h.platform.config().treasury);
    assert_eq!(residual, Amount::new(270));
    assert_eq!(h.platform.vote(vote).unwrap().reward_pool(), Amount::ZERO);

    // The vote's severity overrides the self-reported Low.
    let receipt = h.platform.execute_payout_with_vote(report).unwrap();
    assert_eq!(receipt.severity, Severity::High);
    assert_eq!(receipt.amount, Amount::new(1000));
    assert_eq!(h.platform.report(report).unwrap().status, ReportStatus::Paid);
    assert_eq!(h.escrow_balance(), Amount::new(19_000));
}

// ---------------------------------------------------------------------------
// Scenario B: 60/40 split
// ---------------------------------------------------------------------------

#[test]
fn scenario_b_split_sixty_forty() {
    let h = harness();
    let report = h.accepted_report(Severity::High);
    let (alice, bob) = (addr("alice"), addr("bob"));

    let proposal = h
        .platform
        .propose_split(report, &alice, vec![(alice.clone(), 6000), (bob.clone(), 4000)])
        .unwrap();
    assert_eq!(
        h.platform.execute_split(proposal),
        Err(PlatformError::Settlement(SettlementError::NotAllApproved))
    );
    assert_eq!(
        h.platform.execute_payout(report),
        Err(PlatformError::Settlement(SettlementError::SplitProposalPending))
    );

    assert!(!h.platform.approve_split(proposal, &alice).unwrap());
    assert_eq!(
        h.platform.approve_split(proposal, &alice),
        Err(PlatformError::Settlement(SettlementError::AlreadyApproved(
            alice.clone()
        )))
    );
    assert!(h.platform.approve_split(proposal, &bob).unwrap());

    let approvals: Vec<_> = h
        .platform
        .events()
        .all()
        .into_iter()
        .filter_map(|logged| match logged.event {
            PlatformEvent::SplitApproved {
                program,
                approver,
                share_bps,
                total_amount,
                all_approved,
                ..
            } => Some((program, approver, share_bps, total_amount, all_approved)),
            _ => None,
        })
        .collect();
    assert_eq!(
        approvals,
        vec![
            (h.program, alice.clone(), 6000, Amount::new(1000), false),
            (h.program, bob.clone(), 4000, Amount::new(1000), true),
        ]
    );

    let receipt = h.platform.execute_split(proposal).unwrap();
    assert_eq!(receipt.shares[0].amount, Amount::new(600));
    assert_eq!(receipt.shares[1].amount, Amount::new(400));
    assert_eq!(receipt.dust, Amount::ZERO);

    // alice: 600 share + 10 fee; bob: 400 share only.
    assert_eq!(h.platform.balance_of(&alice).unwrap(), Amount::new(610));
    assert_eq!(h.platform.balance_of(&bob).unwrap(), Amount::new(400));
    assert_eq!(h.escrow_balance(), Amount::new(19_000));

    let r = h.platform.report(report).unwrap();
    assert_eq!(r.status, ReportStatus::Paid);
    assert_eq!(r.split_proposal, None);
    assert!(h.platform.split(proposal).unwrap().executed);
    assert_eq!(
        h.platform.execute_payout(report),
        Err(PlatformError::Settlement(SettlementError::PayoutAlreadyExecuted))
    );
}

// ---------------------------------------------------------------------------
// Scenario C: double payout
// ---------------------------------------------------------------------------

#[test]
fn scenario_c_second_payout_fails_and_escrow_is_debited_once() {
    let h = harness();
    let report = h.accepted_report(Severity::Critical);

    h.platform.execute_payout(report).unwrap();
    assert_eq!(h.escrow_balance(), Amount::new(15_000));

    assert_eq!(
        h.platform.execute_payout(report),
        Err(PlatformError::Settlement(SettlementError::PayoutAlreadyExecuted))
    );
    assert_eq!(h.escrow_balance(), Amount::new(15_000));
    let program = h.platform.program(h.program).unwrap();
    assert_eq!(program.resolved_reports, 1);
    assert_eq!(program.total_paid, Amount::new(5000));
}

// ---------------------------------------------------------------------------
// Scenario D: finalize timing and quorum
// ---------------------------------------------------------------------------

#[test]
fn scenario_d_finalize_before_deadline_then_below_quorum() {
    let h = harness();
    let report = h.report(Severity::Medium);
    let voter = addr("v");
    h.fund(&voter, 999);
    let vote = h
        .platform
        .create_triage_vote(report, &addr("creator"), Amount::ZERO)
        .unwrap();
    h.platform.cast_vote(vote, &voter, 2, Amount::new(999)).unwrap();

    let deadline = h.platform.vote(vote).unwrap().deadline;
    assert_eq!(
        h.platform.finalize_vote(vote),
        Err(PlatformError::Triage(TriageError::VotingNotEnded { deadline }))
    );

    h.clock.advance_past(deadline);
    assert_eq!(
        h.platform.finalize_vote(vote),
        Err(PlatformError::Triage(TriageError::QuorumNotMet {
            have: 999,
            need: 1000
        }))
    );
    assert_eq!(h.platform.vote(vote).unwrap().status(), VoteStatus::Active);

    // Too late to stake now.
    h.fund(&addr("late"), 1);
    assert!(matches!(
        h.platform.cast_vote(vote, &addr("late"), 2, Amount::new(1)),
        Err(PlatformError::Triage(TriageError::VotingEnded { .. }))
    ));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn racing_finalizers_produce_one_transition() {
    let h = harness();
    let report = h.report(Severity::High);
    let voter = addr("v");
    h.fund(&voter, 1000);
    let vote = h
        .platform
        .create_triage_vote(report, &addr("creator"), Amount::ZERO)
        .unwrap();
    h.platform.cast_vote(vote, &voter, 3, Amount::new(1000)).unwrap();
    h.clock
        .advance_past(h.platform.vote(vote).unwrap().deadline);

    let platform = &h.platform;
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || platform.finalize_vote(vote)))
            .collect();
        handles.into_iter().map(|t| t.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for r in results.iter().filter(|r| r.is_err()) {
        assert_eq!(r, &Err(PlatformError::Triage(TriageError::AlreadyFinalized)));
    }
    let finalized = h
        .platform
        .events()
        .all()
        .into_iter()
        .filter(|e| matches!(e.event, PlatformEvent::VoteFinalized { .. }))
        .count();
    assert_eq!(finalized, 1);
}

#[test]
fn racing_payouts_debit_escrow_once() {
    let h = harness();
    let report = h.accepted_report(Severity::High);

    let platform = &h.platform;
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || platform.execute_payout(report)))
            .collect();
        handles.into_iter().map(|t| t.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter(|r| r.is_err()).all(|r| r
        == &Err(PlatformError::Settlement(
            SettlementError::PayoutAlreadyExecuted
        ))));
    assert_eq!(h.escrow_balance(), Amount::new(19_000));
    assert_eq!(h.platform.balance_of(&addr("alice")).unwrap(), Amount::new(1010));
}

#[test]
fn concurrent_casts_by_distinct_voters_all_land() {
    let h = harness();
    let report = h.report(Severity::High);
    let vote = h
        .platform
        .create_triage_vote(report, &addr("creator"), Amount::ZERO)
        .unwrap();
    let voters: Vec<Address> = (0..10).map(|i| addr(&format!("voter{i}"))).collect();
    for v in &voters {
        h.fund(v, 100);
    }

    thread::scope(|s| {
        for (i, v) in voters.iter().enumerate() {
            let platform = &h.platform;
            s.spawn(move || {
                platform
                    .cast_vote(vote, v, (i % 5) as u8, Amount::new(100))
                    .unwrap()
            });
        }
    });

    let v = h.platform.vote(vote).unwrap();
    assert_eq!(v.total_staked(), Amount::new(1000));
    assert_eq!(v.ledger().voter_count(), 10);
    assert!(v.ledger().is_consistent());
}

#[test]
fn injected_conflicts_are_retried_then_exhausted() {
    let config = PlatformConfig {
        max_commit_retries: 2,
        ..PlatformConfig::default()
    };
    let h = harness_with(config);
    let who = addr("retry");

    h.platform.store().inject_conflicts(2);
    let commits = h.platform.store().commit_count();
    h.fund(&who, 5);
    assert_eq!(h.platform.store().commit_count(), commits + 1);
    assert_eq!(h.platform.balance_of(&who).unwrap(), Amount::new(5));

    h.platform.store().inject_conflicts(3);
    assert_eq!(
        h.platform.deposit(&who, Amount::new(5)),
        Err(PlatformError::CommitRetriesExhausted {
            operation: "deposit",
            attempts: 3
        })
    );
    assert_eq!(h.platform.balance_of(&who).unwrap(), Amount::new(5));
}

// ---------------------------------------------------------------------------
// Configuration and events
// ---------------------------------------------------------------------------

#[test]
fn config_file_drives_vote_parameters() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
treasury = "shd_dao"
max_commit_retries = 4

[params]
default_min_quorum = 50
standard_voting_period_secs = 60
"#
    )
    .unwrap();

    let config = PlatformConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.max_commit_retries, 4);
    let h = harness_with(config);
    let report = h.report(Severity::Low);
    let vote = h
        .platform
        .create_triage_vote(report, &addr("creator"), Amount::ZERO)
        .unwrap();
    let v = h.platform.vote(vote).unwrap();
    assert_eq!(v.min_quorum, Amount::new(50));
    assert_eq!(v.deadline.as_secs() - v.created_at.as_secs(), 60);

    h.fund(&addr("v"), 50);
    h.platform.cast_vote(vote, &addr("v"), 1, Amount::new(50)).unwrap();
    h.clock.advance(61);
    h.platform.finalize_vote(vote).unwrap();
    h.platform.claim_reward(vote, &addr("v")).unwrap();
    // A unanimous vote leaves nothing to sweep.
    assert_eq!(
        h.platform.sweep_residual(vote),
        Err(PlatformError::Triage(TriageError::NothingToClaim))
    );
}

#[test]
fn events_are_logged_in_commit_order_and_broadcast() {
    let clock = Arc::new(NullClock::new(100));
    let mut platform =
        Platform::new(NullRecordStore::new(), clock.clone(), PlatformConfig::default()).unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    platform.subscribe(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let owner = addr("owner");
    platform.deposit(&owner, Amount::new(1000)).unwrap();
    let program = platform.register_program(&owner, tiers()).unwrap();
    platform.fund_escrow(program, &owner, Amount::new(1000)).unwrap();
    let report = platform
        .submit_report(program, &addr("alice"), 3, Amount::ZERO)
        .unwrap();
    platform.deposit(&addr("v"), Amount::new(1000)).unwrap();
    let vote = platform
        .create_triage_vote(report, &owner, Amount::ZERO)
        .unwrap();
    platform.cast_vote(vote, &addr("v"), 3, Amount::new(1000)).unwrap();
    clock.advance_past(platform.vote(vote).unwrap().deadline);
    platform.finalize_vote(vote).unwrap();
    platform.execute_payout_with_vote(report).unwrap();
    platform.claim_reward(vote, &addr("v")).unwrap();

    let log = platform.events().all();
    let seqs: Vec<u64> = log.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    assert!(matches!(log[0].event, PlatformEvent::VoteCreated { .. }));
    assert!(matches!(
        &log[1].event,
        PlatformEvent::VoteCast { program: p, voter, stake, .. }
            if *p == program && *voter == addr("v") && *stake == Amount::new(1000)
    ));
    assert!(matches!(log[2].event, PlatformEvent::VoteFinalized { severity: Severity::High, .. }));
    assert!(matches!(
        &log[3].event,
        PlatformEvent::PayoutExecuted { recipient, amount, .. }
            if *recipient == addr("alice") && *amount == Amount::new(1000)
    ));
    assert!(matches!(log[4].event, PlatformEvent::RewardClaimed { .. }));
    assert!(log.windows(2).all(|w| w[0].event.at() <= w[1].event.at()));
    assert_eq!(seen.load(Ordering::SeqCst), 5);
    assert_eq!(platform.events().since(3).len(), 2);
}
