use shield_types::{Address, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriageError {
    #[error("vote is not active")]
    VoteNotActive,

    #[error("voting ended at {deadline}")]
    VotingEnded { deadline: Timestamp },

    #[error("voting has not ended yet (deadline {deadline})")]
    VotingNotEnded { deadline: Timestamp },

    #[error("{0} has already voted")]
    AlreadyVoted(Address),

    #[error("invalid severity choice {0}")]
    InvalidSeverity(u8),

    #[error("stake must be non-zero")]
    ZeroStake,

    #[error("quorum not met: staked {have}, need {need}")]
    QuorumNotMet { have: u128, need: u128 },

    #[error("quorum already reached")]
    QuorumReached,

    #[error("vote is already finalized")]
    AlreadyFinalized,

    #[error("vote is not finalized")]
    VoteNotFinalized,

    #[error("vote is not cancelled")]
    VoteNotCancelled,

    #[error("{0} did not vote")]
    NotVoter(Address),

    #[error("reward already claimed")]
    AlreadyClaimed,

    #[error("nothing to claim")]
    NothingToClaim,

    #[error("only the vote creator may do this")]
    NotCreator,

    #[error("vote may not be cancelled before {until}")]
    CancelTooEarly { until: Timestamp },

    #[error("urgent premium {have} below minimum {need}")]
    InsufficientPremium { have: u128, need: u128 },

    #[error("{0} majority voters have not claimed yet")]
    OutstandingClaims(usize),

    #[error("reward pool exhausted: need {need}, have {have}")]
    PoolExhausted { need: u128, have: u128 },

    #[error("arithmetic overflow in triage accounting")]
    Overflow,
}
