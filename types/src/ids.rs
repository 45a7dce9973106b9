//! Identifiers for the records the core reads and writes.
//!
//! Ids are allocated from per-kind sequences in the record store and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

record_id!(
    /// A disclosed vulnerability report.
    ReportId,
    "report"
);
record_id!(
    /// A bounty program owning an escrow account.
    ProgramId,
    "program"
);
record_id!(
    /// A triage vote instance.
    VoteId,
    "vote"
);
record_id!(
    /// A split-payment proposal.
    ProposalId,
    "split"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        assert_eq!(ReportId::new(3).to_string(), "report#3");
        assert_eq!(VoteId::new(12).to_string(), "vote#12");
    }
}
