//! Account address type with `shd_` prefix.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address on the host ledger, always prefixed with `shd_`.
///
/// Researchers, voters, program owners and the treasury are all plain addresses;
/// the core never inspects anything beyond equality and ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all addresses.
    pub const PREFIX: &'static str = "shd_";

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `shd_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with shd_");
        Self(s)
    }

    /// Parse an address from untrusted input.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let addr = Self(raw.to_string());
        if addr.is_valid() {
            Ok(addr)
        } else {
            Err(TypesError::InvalidAddress(raw.to_string()))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
