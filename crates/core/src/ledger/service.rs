//! Ledger service deciding each write.
//!
//! This module contains the pure decision logic: given the current account
//! state (and, for loans, the relevant records), it validates an operation
//! and produces the [`LedgerWrite`] that storage must commit atomically.
//! Nothing here touches storage.

use bankroll_shared::types::{TransactionId, within_balance_limit};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::policy::LoanPolicy;
use super::types::{Account, LedgerWrite, Transaction, TransactionType, WriteKind};
use super::validation::validate_amount;

/// Stateless service for ledger decisions.
pub struct LedgerService;

impl LedgerService {
    /// Deposit `amount`. Succeeds for a valid amount unless the balance
    /// would outgrow the account column.
    pub fn deposit(
        account: &Account,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, LedgerError> {
        let amount = validate_amount(amount)?;
        let balance = account.balance + amount;
        if !within_balance_limit(balance) {
            return Err(LedgerError::InvalidAmount {
                amount,
                reason: "balance would exceed the account limit",
            });
        }
        Ok(Self::append(
            account,
            TransactionType::Deposit,
            amount,
            balance,
            at,
        ))
    }

    /// Withdraw `amount`. Fails if it exceeds the balance.
    pub fn withdraw(
        account: &Account,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, LedgerError> {
        let amount = validate_amount(amount)?;
        if amount > account.balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: account.balance,
            });
        }
        Ok(Self::append(
            account,
            TransactionType::Withdrawal,
            amount,
            account.balance - amount,
            at,
        ))
    }

    /// Record a loan request of `amount`. The balance is unchanged.
    ///
    /// `approved_loans` is the number of approved, unpaid loans on the account.
    pub fn request_loan(
        account: &Account,
        amount: Decimal,
        approved_loans: u32,
        policy: &LoanPolicy,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, LedgerError> {
        let amount = validate_amount(amount)?;
        if !policy.can_request_loan(approved_loans) {
            return Err(LedgerError::LoanLimitExceeded {
                limit: policy.max_approved_loans(),
            });
        }
        Ok(Self::append(
            account,
            TransactionType::LoanRequest,
            amount,
            account.balance,
            at,
        ))
    }

    /// Approve a pending loan request. Settable exactly once.
    pub fn approve_loan(
        account: &Account,
        loan: &Transaction,
        approved_loans: u32,
        policy: &LoanPolicy,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, LedgerError> {
        Self::ensure_loan_of(account, loan)?;
        if loan.loan_approved {
            return Err(LedgerError::LoanAlreadyApproved(loan.id));
        }
        if !policy.can_request_loan(approved_loans) {
            return Err(LedgerError::LoanLimitExceeded {
                limit: policy.max_approved_loans(),
            });
        }

        let next = Self::next_account(account, account.balance, at);
        let transaction = Transaction {
            loan_approved: true,
            updated_at: at,
            ..loan.clone()
        };
        Ok(LedgerWrite {
            account: next,
            expected_version: account.version,
            transaction,
            kind: WriteKind::Update,
        })
    }

    /// Pay off an approved loan from the balance.
    ///
    /// The loan record itself becomes the payoff record.
    pub fn pay_loan(
        account: &Account,
        loan: &Transaction,
        policy: &LoanPolicy,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, LedgerError> {
        Self::ensure_loan_of(account, loan)?;
        if !loan.loan_approved {
            return Err(LedgerError::LoanNotApproved(loan.id));
        }
        if !policy.can_pay_loan(account, loan.amount) {
            return Err(LedgerError::InsufficientFunds {
                requested: loan.amount,
                available: account.balance,
            });
        }

        let next = Self::next_account(account, account.balance - loan.amount, at);
        let transaction = Transaction {
            transaction_type: TransactionType::LoanPayoff,
            balance_after: next.balance,
            account_version: next.version,
            updated_at: at,
            ..loan.clone()
        };
        Ok(LedgerWrite {
            account: next,
            expected_version: account.version,
            transaction,
            kind: WriteKind::Update,
        })
    }

    /// Checks that `loan` is an open loan request on `account`.
    fn ensure_loan_of(account: &Account, loan: &Transaction) -> Result<(), LedgerError> {
        if loan.account_id != account.id {
            return Err(LedgerError::TransactionNotFound(loan.id));
        }
        if loan.transaction_type != TransactionType::LoanRequest {
            return Err(LedgerError::NotALoanRequest(loan.id));
        }
        Ok(())
    }

    fn append(
        account: &Account,
        transaction_type: TransactionType,
        amount: Decimal,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> LedgerWrite {
        let next = Self::next_account(account, balance, at);
        let transaction = Transaction {
            id: TransactionId::new(),
            account_id: account.id,
            amount,
            transaction_type,
            balance_after: next.balance,
            account_version: next.version,
            loan_approved: false,
            created_at: at,
            updated_at: at,
        };
        LedgerWrite {
            account: next,
            expected_version: account.version,
            transaction,
            kind: WriteKind::Insert,
        }
    }

    fn next_account(account: &Account, balance: Decimal, at: DateTime<Utc>) -> Account {
        Account {
            balance,
            version: account.version + 1,
            updated_at: at,
            ..account.clone()
        }
    }
}
