use shield_types::Severity;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EscrowError {
    #[error("insufficient escrow: need {need}, have {have}")]
    InsufficientEscrow { need: u128, have: u128 },

    #[error("no payout configured for {0} severity")]
    NoPayoutForTier(Severity),

    #[error("only the program owner may do this")]
    NotOwner,

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow in escrow accounting")]
    Overflow,
}
