//! Fundamental types for the Shield settlement core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, amounts, timestamps, severity tiers, entity ids and settlement parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod ids;
pub mod params;
pub mod severity;
pub mod time;

pub use address::Address;
pub use amount::{Amount, BPS_DENOMINATOR};
pub use error::TypesError;
pub use ids::{ProgramId, ProposalId, ReportId, VoteId};
pub use params::SettlementParams;
pub use severity::{Severity, SeverityBuckets};
pub use time::{Clock, SystemClock, Timestamp};
