//! Host balance book: one `Amount` record per address.
//!
//! All movements happen inside the caller's transaction, so a debit and the
//! matching custody write commit together or not at all.

use shield_store::{RecordKey, Transaction};
use shield_types::{Address, Amount};

use crate::PlatformError;

pub fn balance(txn: &mut Transaction<'_>, who: &Address) -> Result<Amount, PlatformError> {
    Ok(txn
        .get::<Amount>(&RecordKey::Balance(who.clone()))?
        .unwrap_or(Amount::ZERO))
}

/// Add `amount` to `who`. A zero credit writes nothing.
pub fn credit(
    txn: &mut Transaction<'_>,
    who: &Address,
    amount: Amount,
) -> Result<Amount, PlatformError> {
    let current = balance(txn, who)?;
    if amount.is_zero() {
        return Ok(current);
    }
    let updated = current.checked_add(amount).ok_or(PlatformError::Overflow)?;
    txn.put(RecordKey::Balance(who.clone()), &updated)?;
    Ok(updated)
}

/// Take `amount` from `who`, failing without a write if the balance is short.
pub fn debit(
    txn: &mut Transaction<'_>,
    who: &Address,
    amount: Amount,
) -> Result<Amount, PlatformError> {
    let current = balance(txn, who)?;
    if amount.is_zero() {
        return Ok(current);
    }
    let updated = current
        .checked_sub(amount)
        .ok_or(PlatformError::InsufficientBalance {
            need: amount.raw(),
            have: current.raw(),
        })?;
    txn.put(RecordKey::Balance(who.clone()), &updated)?;
    Ok(updated)
}
