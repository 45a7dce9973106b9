//! Record keys.

use serde::{Deserialize, Serialize};
use shield_types::{Address, ProgramId, ProposalId, ReportId, VoteId};
use std::fmt;

/// Id sequences allocated inside transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sequence {
    Programs,
    Reports,
    Votes,
    Proposals,
}

/// Key of a single record in the store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordKey {
    Program(ProgramId),
    Report(ReportId),
    Vote(VoteId),
    /// Insert-once report → vote mapping.
    Registry(ReportId),
    Split(ProposalId),
    Balance(Address),
    Sequence(Sequence),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Program(id) => write!(f, "{id}"),
            RecordKey::Report(id) => write!(f, "{id}"),
            RecordKey::Vote(id) => write!(f, "{id}"),
            RecordKey::Registry(id) => write!(f, "registry/{id}"),
            RecordKey::Split(id) => write!(f, "{id}"),
            RecordKey::Balance(addr) => write!(f, "balance/{addr}"),
            RecordKey::Sequence(seq) => write!(f, "sequence/{seq:?}"),
        }
    }
}
