//! Escrow settlement for the Shield core.
//!
//! Converts an accepted report (or a finalized triage vote) into an exact
//! payout from the program's escrow, either to the researcher alone or fanned
//! out over a unanimously approved split proposal.
//!
//! Every operation validates all of its preconditions before mutating
//! anything, so a failed call leaves report, program and proposal untouched.

pub mod error;
pub mod payout;
pub mod report;
pub mod split;

pub use error::SettlementError;
pub use payout::{execute_payout, execute_payout_from_vote, PayoutReceipt};
pub use report::{BugReport, ReportStatus};
pub use split::{
    cancel_split, execute_split, propose_split, split_amounts, SplitProposal, SplitReceipt,
    SplitRecipient, SplitShare,
};
