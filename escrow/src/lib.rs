//! Escrow accounts held by bounty programs.
//!
//! The settlement core only reads tier amounts and debits the balance;
//! funding and tier-table edits are owner operations exposed here for the
//! program-management side.

pub mod account;
pub mod error;
pub mod program;

pub use account::EscrowAccount;
pub use error::EscrowError;
pub use program::BountyProgram;
