//! Abstract storage for the Shield settlement core.
//!
//! Every entity (vote, report, program, split proposal, balance) is a
//! bincode-encoded record under a [`RecordKey`]. Backends implement
//! [`RecordStore`]: point reads plus an atomic, all-or-nothing
//! compare-and-swap commit of a [`WriteBatch`]. The engines never talk to a
//! backend directly; they stage reads and writes in a [`Transaction`].

pub mod batch;
pub mod error;
pub mod key;
pub mod record;
pub mod txn;

pub use batch::{PendingWrite, ReadCheck, WriteBatch};
pub use error::StoreError;
pub use key::{RecordKey, Sequence};
pub use record::{RecordStore, VersionedRecord};
pub use txn::Transaction;
