use crate::report::ReportStatus;
use shield_escrow::EscrowError;
use shield_types::{Address, Severity};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("only the report's researcher may do this")]
    NotResearcher,

    #[error("report is {found:?}, operation needs {expected}")]
    InvalidStatus {
        expected: &'static str,
        found: ReportStatus,
    },

    #[error("report cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: ReportStatus, to: ReportStatus },

    #[error("payout already executed")]
    PayoutAlreadyExecuted,

    #[error("report already has a split proposal")]
    SplitProposalExists,

    #[error("report has a pending split proposal")]
    SplitProposalPending,

    #[error("proposal is not the report's live split proposal")]
    NoSplitProposal,

    #[error("report already has a triage vote")]
    VoteAlreadyLinked,

    #[error("no payout for {0} severity")]
    InvalidSeverity(Severity),

    #[error("insufficient escrow: need {need}, have {have}")]
    InsufficientEscrow { need: u128, have: u128 },

    #[error("split needs at least one recipient")]
    EmptyRecipients,

    #[error("too many split recipients: {got} > {max}")]
    TooManyRecipients { max: usize, got: usize },

    #[error("duplicate split recipient {0}")]
    DuplicateRecipient(Address),

    #[error("split recipient {0} has a zero share")]
    ZeroShare(Address),

    #[error("split shares sum to {total} basis points, expected 10000")]
    InvalidShares { total: u64 },

    #[error("{0} is not a split recipient")]
    NotRecipient(Address),

    #[error("{0} already approved")]
    AlreadyApproved(Address),

    #[error("not every recipient has approved")]
    NotAllApproved,

    #[error("split already executed")]
    AlreadyExecuted,

    #[error("triage vote is not finalized")]
    VoteNotFinalized,

    #[error("triage vote belongs to a different report or program")]
    VoteMismatch,

    #[error("report belongs to a different program")]
    ProgramMismatch,

    #[error("escrow error: {0}")]
    Escrow(EscrowError),

    #[error("arithmetic overflow in settlement")]
    Overflow,
}

impl From<EscrowError> for SettlementError {
    fn from(e: EscrowError) -> Self {
        match e {
            EscrowError::NoPayoutForTier(severity) => SettlementError::InvalidSeverity(severity),
            EscrowError::InsufficientEscrow { need, have } => {
                SettlementError::InsufficientEscrow { need, have }
            }
            EscrowError::Overflow => SettlementError::Overflow,
            other => SettlementError::Escrow(other),
        }
    }
}
