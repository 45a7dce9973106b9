//! Errors raised while constructing core types from untrusted input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid severity: {0} (expected 0..=4)")]
    InvalidSeverity(u8),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
