//! Ledger domain types.
//!
//! Accounts hold one customer's balance. Transactions are the append-only
//! record of every balance-affecting event, plus loan requests that wait for
//! approval and payoff.

use bankroll_shared::types::{AccountId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of ledger event recorded by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Cash paid into the account.
    Deposit,
    /// Cash taken out of the account.
    Withdrawal,
    /// Loan awaiting approval or payoff. Does not move the balance.
    LoanRequest,
    /// Loan settled against the account balance.
    LoanPayoff,
}

impl TransactionType {
    /// Returns the effect of `amount` on the balance for this kind of event.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Deposit => amount,
            Self::Withdrawal | Self::LoanPayoff => -amount,
            Self::LoanRequest => Decimal::ZERO,
        }
    }

    /// Returns the snake_case name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::LoanRequest => "loan_request",
            Self::LoanPayoff => "loan_payoff",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer account. Exactly one per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// The user owning this account.
    pub owner_id: UserId,
    /// Current balance.
    pub balance: Decimal,
    /// Write counter, bumped by every ledger write.
    pub version: i64,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
    /// When the account was last written.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Opens a new, empty account for `owner_id`.
    #[must_use]
    pub fn open(owner_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            owner_id,
            balance: Decimal::ZERO,
            version: 0,
            created_at: at,
            updated_at: at,
        }
    }

    /// Returns true if `user` owns this account.
    #[must_use]
    pub fn is_owned_by(&self, user: &AuthenticatedUser) -> bool {
        self.owner_id == user.user_id
    }
}

/// A ledger transaction record.
///
/// Records are append-only. The only permitted edits are the one-time
/// `loan_approved` flip and the `LoanRequest` to `LoanPayoff` transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique, time-ordered identifier.
    pub id: TransactionId,
    /// The account this record belongs to.
    pub account_id: AccountId,
    /// Positive amount.
    pub amount: Decimal,
    /// Kind of event.
    pub transaction_type: TransactionType,
    /// Account balance right after this record was written.
    pub balance_after: Decimal,
    /// Account version at which `balance_after` was recorded.
    pub account_version: i64,
    /// Whether a loan request has been approved.
    pub loan_approved: bool,
    /// Creation time, used for ordering.
    pub created_at: DateTime<Utc>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the signed effect of this record on the balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.transaction_type.signed(self.amount)
    }

    /// Returns true for a loan request that has been approved but not paid.
    #[must_use]
    pub fn is_approved_loan(&self) -> bool {
        self.transaction_type == TransactionType::LoanRequest && self.loan_approved
    }
}

/// The caller's identity, established by the external auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The authenticated user.
    pub user_id: UserId,
}

impl AuthenticatedUser {
    /// Wraps an authenticated user ID.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// A ledger operation requested by an account owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOperation {
    /// Pay `amount` into the account.
    Deposit {
        /// Amount to deposit.
        amount: Decimal,
    },
    /// Take `amount` out of the account.
    Withdrawal {
        /// Amount to withdraw.
        amount: Decimal,
    },
    /// Ask for a loan of `amount`.
    LoanRequest {
        /// Amount requested.
        amount: Decimal,
    },
    /// Settle the approved loan recorded as `loan_id`.
    LoanPayoff {
        /// The originating loan request.
        loan_id: TransactionId,
    },
}

impl LedgerOperation {
    /// Returns the record type this operation produces.
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Deposit { .. } => TransactionType::Deposit,
            Self::Withdrawal { .. } => TransactionType::Withdrawal,
            Self::LoanRequest { .. } => TransactionType::LoanRequest,
            Self::LoanPayoff { .. } => TransactionType::LoanPayoff,
        }
    }
}

/// Whether a write appends a new record or rewrites an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Append a new record.
    Insert,
    /// Rewrite an existing record (loan approval or payoff).
    Update,
}

/// One atomic unit of ledger work: the new account state plus exactly one
/// new or rewritten record.
///
/// Storage must apply it only if the stored account version still equals
/// `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerWrite {
    /// Account state after the write.
    pub account: Account,
    /// Account version the decision was based on.
    pub expected_version: i64,
    /// The record to insert or rewrite.
    pub transaction: Transaction,
    /// Insert or update.
    pub kind: WriteKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signed_amounts() {
        assert_eq!(TransactionType::Deposit.signed(dec!(10)), dec!(10));
        assert_eq!(TransactionType::Withdrawal.signed(dec!(10)), dec!(-10));
        assert_eq!(TransactionType::LoanRequest.signed(dec!(10)), Decimal::ZERO);
        assert_eq!(TransactionType::LoanPayoff.signed(dec!(10)), dec!(-10));
    }

    #[test]
    fn test_open_account_is_empty() {
        let owner = UserId::new();
        let account = Account::open(owner, Utc::now());
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.version, 0);
        assert!(account.is_owned_by(&AuthenticatedUser::new(owner)));
        assert!(!account.is_owned_by(&AuthenticatedUser::new(UserId::new())));
    }

    #[test]
    fn test_operation_types() {
        assert_eq!(
            LedgerOperation::Deposit { amount: dec!(1) }.transaction_type(),
            TransactionType::Deposit
        );
        assert_eq!(
            LedgerOperation::LoanPayoff {
                loan_id: TransactionId::new()
            }
            .transaction_type(),
            TransactionType::LoanPayoff
        );
    }
}
