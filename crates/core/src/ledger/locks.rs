//! Per-account write locks.

use std::sync::Arc;

use bankroll_shared::types::AccountId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-account mutexes.
///
/// Writes to one account are serialised; writes to different accounts run
/// in parallel. An entry lives only while someone holds or waits for it, so
/// the registry stays as large as the set of accounts in flight.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

/// Exclusive access to one account, released on drop.
#[derive(Debug)]
#[must_use = "the account is unlocked as soon as the guard is dropped"]
pub struct AccountGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<AccountId, Arc<Mutex<()>>>,
    account_id: AccountId,
}

impl Drop for AccountGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so our own handle no longer counts.
        drop(self.guard.take());
        // Waiters clone the handle under the shard lock, so a count of one
        // means the map holds the only reference.
        self.locks
            .remove_if(&self.account_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl AccountLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `account_id`.
    pub async fn acquire(&self, account_id: AccountId) -> AccountGuard<'_> {
        // The shard guard must be released before awaiting.
        let lock = Arc::clone(self.locks.entry(account_id).or_default().value());
        let guard = lock.lock_owned().await;
        AccountGuard {
            guard: Some(guard),
            locks: &self.locks,
            account_id,
        }
    }

    /// Number of accounts currently locked or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no account is locked or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_is_exclusive() {
        let locks = AccountLocks::new();
        let id = AccountId::new();

        let guard = locks.acquire(id).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(id)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(200), locks.acquire(id)).await;
        assert!(third.is_ok());
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_different_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _a = locks.acquire(AccountId::new()).await;
        let b =
            tokio::time::timeout(Duration::from_millis(200), locks.acquire(AccountId::new())).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = AccountLocks::new();
        for _ in 0..100 {
            let _guard = locks.acquire(AccountId::new()).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_the_entry() {
        let locks = Arc::new(AccountLocks::new());
        let id = AccountId::new();

        let guard = locks.acquire(id).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
