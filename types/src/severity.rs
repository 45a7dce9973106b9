//! Severity tiers and the fixed five-bucket array indexed by them.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Ordinal vulnerability severity. The discriminant is the on-wire choice (0–4).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// Also the "not yet decided" sentinel on an unfinalized vote.
    #[default]
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Severity {
    /// Number of severity tiers.
    pub const COUNT: usize = 5;

    /// All tiers in ascending order. Tie-breaking relies on this order.
    pub const ALL: [Severity; Self::COUNT] = [
        Severity::None,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Severity {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(TypesError::InvalidSeverity(value))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// One value per severity tier, stored as a fixed array so iteration order is
/// always None → Critical.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBuckets<T>([T; Severity::COUNT]);

impl<T: Copy> SeverityBuckets<T> {
    pub fn new(values: [T; Severity::COUNT]) -> Self {
        Self(values)
    }

    pub fn filled(value: T) -> Self {
        Self([value; Severity::COUNT])
    }

    pub fn get(&self, severity: Severity) -> T {
        self.0[severity.index()]
    }

    /// Iterate `(severity, value)` pairs in ascending severity order.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, T)> + '_ {
        Severity::ALL.iter().map(move |s| (*s, self.0[s.index()]))
    }

    pub fn values(&self) -> &[T; Severity::COUNT] {
        &self.0
    }
}

impl<T> Index<Severity> for SeverityBuckets<T> {
    type Output = T;
    fn index(&self, severity: Severity) -> &T {
        &self.0[severity.index()]
    }
}

impl<T> IndexMut<Severity> for SeverityBuckets<T> {
    fn index_mut(&mut self, severity: Severity) -> &mut T {
        &mut self.0[severity.index()]
    }
}
