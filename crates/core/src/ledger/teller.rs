//! Teller: the entry point for ledger operations.
//!
//! The teller loads the account, checks the caller, asks [`LedgerService`]
//! for a decision and hands the resulting [`LedgerWrite`] to the repository.
//! Writes to one account are serialised by an in-process lock. The
//! repository's version check catches writers outside this process, and a
//! lost race is retried from a fresh read.

use std::sync::Arc;

use bankroll_shared::LedgerConfig;
use bankroll_shared::types::{AccountId, TransactionId};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::error::LedgerError;
use super::history::verify_ledger;
use super::locks::AccountLocks;
use super::notice::Notice;
use super::policy::LoanPolicy;
use super::repository::LedgerRepository;
use super::service::LedgerService;
use super::types::{Account, AuthenticatedUser, LedgerOperation, LedgerWrite, Transaction};

/// A write the teller knows how to decide.
#[derive(Debug, Clone, Copy)]
enum Command {
    Operation(LedgerOperation),
    ApproveLoan(TransactionId),
}

/// Orchestrates ledger operations over a repository.
pub struct Teller<R> {
    repository: Arc<R>,
    locks: AccountLocks,
    policy: LoanPolicy,
    history_limit: usize,
    max_retries: u32,
    currency_label: String,
}

impl<R: LedgerRepository> Teller<R> {
    /// Creates a teller over `repository` with rules from `config`.
    #[must_use]
    pub fn new(repository: Arc<R>, config: &LedgerConfig) -> Self {
        Self {
            repository,
            locks: AccountLocks::new(),
            policy: LoanPolicy::from_config(config),
            history_limit: config.history_limit,
            max_retries: config.max_retries,
            currency_label: config.currency_label.clone(),
        }
    }

    /// The underlying repository.
    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// The loan policy in force.
    #[must_use]
    pub const fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// Opens the caller's account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountAlreadyExists`] if the caller already has one.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn open_account(&self, user: &AuthenticatedUser) -> Result<Account, LedgerError> {
        let account = self
            .repository
            .create_account(Account::open(user.user_id, Utc::now()))
            .await?;
        info!(account_id = %account.id, "Account opened");
        Ok(account)
    }

    /// Returns the caller's account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NoAccountForUser`] if the caller has none.
    pub async fn account_for(&self, user: &AuthenticatedUser) -> Result<Account, LedgerError> {
        self.repository
            .find_by_owner(user.user_id)
            .await?
            .ok_or(LedgerError::NoAccountForUser(user.user_id))
    }

    /// Applies `operation` to `account_id` on behalf of its owner.
    ///
    /// Returns the created or rewritten record.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller does not own the account, the amount is
    /// invalid, a policy refuses the operation, or the retry budget runs out.
    #[tracing::instrument(
        skip(self, user),
        fields(user_id = %user.user_id, kind = %operation.transaction_type())
    )]
    pub async fn apply(
        &self,
        user: &AuthenticatedUser,
        account_id: AccountId,
        operation: LedgerOperation,
    ) -> Result<Transaction, LedgerError> {
        let account = self.load(account_id).await?;
        if !account.is_owned_by(user) {
            return Err(LedgerError::NotAccountOwner(account_id));
        }
        self.commit(account_id, Command::Operation(operation)).await
    }

    /// Deposits `amount`.
    ///
    /// # Errors
    ///
    /// See [`Teller::apply`].
    pub async fn deposit(
        &self,
        user: &AuthenticatedUser,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.apply(user, account_id, LedgerOperation::Deposit { amount })
            .await
    }

    /// Withdraws `amount`.
    ///
    /// # Errors
    ///
    /// See [`Teller::apply`].
    pub async fn withdraw(
        &self,
        user: &AuthenticatedUser,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.apply(user, account_id, LedgerOperation::Withdrawal { amount })
            .await
    }

    /// Requests a loan of `amount`.
    ///
    /// # Errors
    ///
    /// See [`Teller::apply`].
    pub async fn request_loan(
        &self,
        user: &AuthenticatedUser,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.apply(user, account_id, LedgerOperation::LoanRequest { amount })
            .await
    }

    /// Pays off the approved loan `loan_id`.
    ///
    /// # Errors
    ///
    /// See [`Teller::apply`].
    pub async fn pay_loan(
        &self,
        user: &AuthenticatedUser,
        account_id: AccountId,
        loan_id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        self.apply(user, account_id, LedgerOperation::LoanPayoff { loan_id })
            .await
    }

    /// Approves a pending loan request. The approver must not own the account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SelfApproval`] for the owner, and the loan
    /// errors of [`LedgerService::approve_loan`].
    #[tracing::instrument(skip(self, approver), fields(approver_id = %approver.user_id))]
    pub async fn approve_loan(
        &self,
        approver: &AuthenticatedUser,
        account_id: AccountId,
        loan_id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let account = self.load(account_id).await?;
        if account.is_owned_by(approver) {
            return Err(LedgerError::SelfApproval(account_id));
        }
        self.commit(account_id, Command::ApproveLoan(loan_id)).await
    }

    /// Returns the most recent records, newest first.
    ///
    /// `limit` defaults to the configured history limit.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotAccountOwner`] if the caller does not own the account.
    pub async fn recent(
        &self,
        user: &AuthenticatedUser,
        account_id: AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let account = self.load(account_id).await?;
        if !account.is_owned_by(user) {
            return Err(LedgerError::NotAccountOwner(account_id));
        }
        self.repository
            .recent(account_id, limit.unwrap_or(self.history_limit))
            .await
    }

    /// Replays the account's records against its stored balance.
    ///
    /// Only the owner may verify, as with [`Teller::recent`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotAccountOwner`] if the caller does not own the
    /// account, and [`LedgerError::LedgerMismatch`] if the replay disagrees.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn verify(
        &self,
        user: &AuthenticatedUser,
        account_id: AccountId,
    ) -> Result<Decimal, LedgerError> {
        let _guard = self.locks.acquire(account_id).await;
        let account = self.load(account_id).await?;
        if !account.is_owned_by(user) {
            return Err(LedgerError::NotAccountOwner(account_id));
        }
        let records = self.repository.history(account_id).await?;
        verify_ledger(&account, &records).inspect_err(|err| {
            warn!(error = %err, "Ledger verification failed");
        })
    }

    /// Builds the notice for an operation outcome.
    #[must_use]
    pub fn notice(&self, outcome: &Result<Transaction, LedgerError>) -> Notice {
        match outcome {
            Ok(transaction) => Notice::for_transaction(transaction, &self.currency_label),
            Err(err) => Notice::for_error(err, &self.currency_label),
        }
    }

    async fn load(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.repository
            .get(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Read, decide and save under the account lock, retrying lost races.
    async fn commit(
        &self,
        account_id: AccountId,
        command: Command,
    ) -> Result<Transaction, LedgerError> {
        let _guard = self.locks.acquire(account_id).await;
        let mut attempt = 0;
        loop {
            let account = self.load(account_id).await?;
            let write = self.decide(&account, command).await?;
            match self.repository.save(&write).await {
                Ok(()) => {
                    info!(
                        account_id = %account_id,
                        transaction_id = %write.transaction.id,
                        kind = %write.transaction.transaction_type,
                        balance = %write.account.balance,
                        version = write.account.version,
                        "Ledger write committed"
                    );
                    return Ok(write.transaction);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(account_id = %account_id, attempt, "Lost version race, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn decide(
        &self,
        account: &Account,
        command: Command,
    ) -> Result<LedgerWrite, LedgerError> {
        let now = Utc::now();
        match command {
            Command::Operation(LedgerOperation::Deposit { amount }) => {
                LedgerService::deposit(account, amount, now)
            }
            Command::Operation(LedgerOperation::Withdrawal { amount }) => {
                LedgerService::withdraw(account, amount, now)
            }
            Command::Operation(LedgerOperation::LoanRequest { amount }) => {
                let approved = self.repository.count_approved_loans(account.id).await?;
                debug!(approved, "Approved loans on account");
                LedgerService::request_loan(account, amount, approved, &self.policy, now)
            }
            Command::Operation(LedgerOperation::LoanPayoff { loan_id }) => {
                let loan = self.find_loan(account, loan_id).await?;
                LedgerService::pay_loan(account, &loan, &self.policy, now)
            }
            Command::ApproveLoan(loan_id) => {
                let loan = self.find_loan(account, loan_id).await?;
                let approved = self.repository.count_approved_loans(account.id).await?;
                LedgerService::approve_loan(account, &loan, approved, &self.policy, now)
            }
        }
    }

    async fn find_loan(
        &self,
        account: &Account,
        loan_id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        self.repository
            .find_transaction(account.id, loan_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(loan_id))
    }
}
