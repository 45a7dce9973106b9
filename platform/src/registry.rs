//! Report → triage vote registry. One entry per report, written once.

use shield_settlement::SettlementError;
use shield_store::{RecordKey, StoreError, Transaction};
use shield_types::{ReportId, VoteId};

use crate::PlatformError;

pub fn register(
    txn: &mut Transaction<'_>,
    report: ReportId,
    vote: VoteId,
) -> Result<(), PlatformError> {
    match txn.insert_once(RecordKey::Registry(report), &vote) {
        Err(StoreError::Duplicate(_)) => Err(SettlementError::VoteAlreadyLinked.into()),
        other => Ok(other?),
    }
}

pub fn lookup(txn: &mut Transaction<'_>, report: ReportId) -> Result<Option<VoteId>, PlatformError> {
    Ok(txn.get(&RecordKey::Registry(report))?)
}
