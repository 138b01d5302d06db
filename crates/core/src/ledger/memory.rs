//! In-memory ledger repository.
//!
//! Backs the teller in tests and demos. Each account and its records live
//! behind one `DashMap` entry, so a save holds that entry's write lock for the
//! whole check-and-apply.

use bankroll_shared::types::{AccountId, TransactionId, UserId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::error::LedgerError;
use super::history;
use super::policy::count_approved_loans;
use super::repository::LedgerRepository;
use super::types::{Account, LedgerWrite, Transaction, WriteKind};

#[derive(Debug, Clone)]
struct AccountRecord {
    account: Account,
    transactions: Vec<Transaction>,
}

/// Ledger repository kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    accounts: DashMap<AccountId, AccountRecord>,
    owners: DashMap<UserId, AccountId>,
}

impl InMemoryLedgerRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_record<T>(
        &self,
        account_id: AccountId,
        f: impl FnOnce(&AccountRecord) -> T,
    ) -> Option<T> {
        self.accounts.get(&account_id).map(|entry| f(entry.value()))
    }
}

impl LedgerRepository for InMemoryLedgerRepository {
    async fn create_account(&self, account: Account) -> Result<Account, LedgerError> {
        match self.owners.entry(account.owner_id) {
            Entry::Occupied(_) => Err(LedgerError::AccountAlreadyExists(account.owner_id)),
            Entry::Vacant(slot) => {
                self.accounts.insert(
                    account.id,
                    AccountRecord {
                        account: account.clone(),
                        transactions: Vec::new(),
                    },
                );
                slot.insert(account.id);
                Ok(account)
            }
        }
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.with_record(account_id, |r| r.account.clone()))
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Option<Account>, LedgerError> {
        let Some(account_id) = self.owners.get(&owner_id).map(|id| *id) else {
            return Ok(None);
        };
        self.get(account_id).await
    }

    async fn find_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        Ok(self
            .with_record(account_id, |r| {
                r.transactions.iter().find(|t| t.id == transaction_id).cloned()
            })
            .flatten())
    }

    async fn count_approved_loans(&self, account_id: AccountId) -> Result<u32, LedgerError> {
        Ok(self
            .with_record(account_id, |r| count_approved_loans(&r.transactions))
            .unwrap_or(0))
    }

    async fn recent(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .with_record(account_id, |r| history::recent(&r.transactions, limit))
            .unwrap_or_default())
    }

    async fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .with_record(account_id, |r| r.transactions.clone())
            .unwrap_or_default())
    }

    async fn save(&self, write: &LedgerWrite) -> Result<(), LedgerError> {
        let account_id = write.account.id;
        let mut entry = self
            .accounts
            .get_mut(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        let record = entry.value_mut();

        if record.account.version != write.expected_version {
            return Err(LedgerError::ConcurrentModification(account_id));
        }

        match write.kind {
            WriteKind::Insert => {
                record.transactions.push(write.transaction.clone());
            }
            WriteKind::Update => {
                let existing = record
                    .transactions
                    .iter_mut()
                    .find(|t| t.id == write.transaction.id)
                    .ok_or(LedgerError::TransactionNotFound(write.transaction.id))?;
                *existing = write.transaction.clone();
            }
        }
        record.account = write.account.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::ledger::service::LedgerService;

    #[tokio::test]
    async fn test_one_account_per_owner() {
        let repo = InMemoryLedgerRepository::new();
        let owner = UserId::new();

        repo.create_account(Account::open(owner, Utc::now())).await.unwrap();
        let second = repo.create_account(Account::open(owner, Utc::now())).await;
        assert_eq!(second, Err(LedgerError::AccountAlreadyExists(owner)));
    }

    #[tokio::test]
    async fn test_save_applies_account_and_record() {
        let repo = InMemoryLedgerRepository::new();
        let account = repo
            .create_account(Account::open(UserId::new(), Utc::now()))
            .await
            .unwrap();

        let write = LedgerService::deposit(&account, dec!(50.00), Utc::now()).unwrap();
        repo.save(&write).await.unwrap();

        let stored = repo.get(account.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(50.00));
        assert_eq!(stored.version, 1);
        assert_eq!(repo.history(account.id).await.unwrap(), vec![write.transaction]);
        assert_eq!(repo.find_by_owner(account.owner_id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_stale_save_changes_nothing() {
        let repo = InMemoryLedgerRepository::new();
        let account = repo
            .create_account(Account::open(UserId::new(), Utc::now()))
            .await
            .unwrap();

        let first = LedgerService::deposit(&account, dec!(10), Utc::now()).unwrap();
        let stale = LedgerService::deposit(&account, dec!(20), Utc::now()).unwrap();
        repo.save(&first).await.unwrap();

        assert_eq!(
            repo.save(&stale).await,
            Err(LedgerError::ConcurrentModification(account.id))
        );
        let stored = repo.get(account.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(10));
        assert_eq!(repo.history(account.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_of_unknown_record_changes_nothing() {
        let repo = InMemoryLedgerRepository::new();
        let account = repo
            .create_account(Account::open(UserId::new(), Utc::now()))
            .await
            .unwrap();

        let mut write = LedgerService::deposit(&account, dec!(10), Utc::now()).unwrap();
        write.kind = WriteKind::Update;
        assert_eq!(
            repo.save(&write).await,
            Err(LedgerError::TransactionNotFound(write.transaction.id))
        );
        assert_eq!(repo.get(account.id).await.unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_missing_account_reads_empty() {
        let repo = InMemoryLedgerRepository::new();
        let id = AccountId::new();
        assert_eq!(repo.get(id).await.unwrap(), None);
        assert_eq!(repo.count_approved_loans(id).await.unwrap(), 0);
        assert!(repo.recent(id, 10).await.unwrap().is_empty());
        assert_eq!(repo.find_by_owner(UserId::new()).await.unwrap(), None);
    }
}
