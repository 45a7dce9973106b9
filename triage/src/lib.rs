//! Triage voting for the Shield settlement core.
//!
//! A triage vote decides the severity of a disclosed vulnerability:
//! voters stake onto one of five severity buckets, the vote finalizes to the
//! bucket with the most stake once the deadline has passed and quorum is met,
//! and the minority's stake is slashed in favour of the majority.
//!
//! Key principle: stake-weighted, one record per voter, no re-votes.
//! Ties go to the lower severity.

pub mod error;
pub mod ledger;
pub mod record;
pub mod reward;
pub mod vote;

pub use error::TriageError;
pub use ledger::StakeLedger;
pub use record::VoteRecord;
pub use reward::{calculate_voter_reward, slash_amount, RewardBreakdown};
pub use vote::{TriageVote, VoteStatus};
