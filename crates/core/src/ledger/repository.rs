//! Ledger storage abstraction.

use bankroll_shared::types::{AccountId, TransactionId, UserId};

use super::error::LedgerError;
use super::types::{Account, LedgerWrite, Transaction};

/// Persistence for accounts and their transaction records.
///
/// Implementations must make [`LedgerRepository::save`] atomic: the account
/// update and the record write either both land or neither does.
pub trait LedgerRepository: Send + Sync {
    /// Stores a freshly opened account.
    ///
    /// Fails with [`LedgerError::AccountAlreadyExists`] if the owner already
    /// has one.
    fn create_account(
        &self,
        account: Account,
    ) -> impl std::future::Future<Output = Result<Account, LedgerError>> + Send;

    /// Loads an account by ID.
    fn get(
        &self,
        account_id: AccountId,
    ) -> impl std::future::Future<Output = Result<Option<Account>, LedgerError>> + Send;

    /// Loads the account owned by `owner_id`.
    fn find_by_owner(
        &self,
        owner_id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<Account>, LedgerError>> + Send;

    /// Loads one record, scoped to its account.
    fn find_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> impl std::future::Future<Output = Result<Option<Transaction>, LedgerError>> + Send;

    /// Counts approved loan requests that are not paid off.
    fn count_approved_loans(
        &self,
        account_id: AccountId,
    ) -> impl std::future::Future<Output = Result<u32, LedgerError>> + Send;

    /// Returns up to `limit` records, most recent first.
    fn recent(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;

    /// Returns every record of the account in write order.
    fn history(
        &self,
        account_id: AccountId,
    ) -> impl std::future::Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;

    /// Atomically applies `write`.
    ///
    /// Fails with [`LedgerError::ConcurrentModification`] if the stored
    /// account version differs from `write.expected_version`.
    fn save(
        &self,
        write: &LedgerWrite,
    ) -> impl std::future::Future<Output = Result<(), LedgerError>> + Send;
}
