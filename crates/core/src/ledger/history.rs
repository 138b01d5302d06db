//! Transaction history and ledger replay.

use std::cmp::Reverse;

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{Account, Transaction};

/// Default number of records shown in recent history.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Returns up to `limit` records, most recent first.
///
/// Ties on `created_at` are broken by `account_version`.
#[must_use]
pub fn recent(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|t| Reverse((t.created_at, t.account_version)));
    sorted.truncate(limit);
    sorted
}

/// Sums the signed amounts of every record.
#[must_use]
pub fn replay_balance(transactions: &[Transaction]) -> Decimal {
    transactions.iter().map(Transaction::signed_amount).sum()
}

/// Checks that the records reproduce the stored balance.
///
/// Both the replayed sum and the `balance_after` of the latest write must
/// equal `account.balance`. Returns the balance on success.
///
/// # Errors
///
/// Returns [`LedgerError::LedgerMismatch`] if either check fails.
pub fn verify_ledger(
    account: &Account,
    transactions: &[Transaction],
) -> Result<Decimal, LedgerError> {
    let replayed = replay_balance(transactions);
    if replayed != account.balance {
        return Err(LedgerError::LedgerMismatch {
            account_id: account.id,
            expected: account.balance,
            replayed,
        });
    }

    if let Some(last) = transactions.iter().max_by_key(|t| t.account_version)
        && last.balance_after != account.balance
    {
        return Err(LedgerError::LedgerMismatch {
            account_id: account.id,
            expected: account.balance,
            replayed: last.balance_after,
        });
    }

    Ok(account.balance)
}
