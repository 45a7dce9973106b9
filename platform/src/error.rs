use shield_escrow::EscrowError;
use shield_settlement::SettlementError;
use shield_store::StoreError;
use shield_triage::TriageError;
use shield_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("triage error: {0}")]
    Triage(#[from] TriageError),

    #[error("escrow error: {0}")]
    Escrow(#[from] EscrowError),

    #[error("settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid value: {0}")]
    Types(#[from] TypesError),

    #[error("config error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("caller is not allowed to {0}")]
    Unauthorized(&'static str),

    #[error("{operation} gave up after {attempts} conflicting commits")]
    CommitRetriesExhausted {
        operation: &'static str,
        attempts: u32,
    },

    #[error("arithmetic overflow in balance accounting")]
    Overflow,
}
