//! Ledger error types.
//!
//! Every error is scoped to a single request: the operation is rejected and
//! nothing is committed.

use bankroll_shared::AppError;
use bankroll_shared::types::{AccountId, TransactionId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is non-positive or exceeds the accepted precision.
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Decimal,
        /// Which rule it broke.
        reason: &'static str,
    },

    // ========== Business Rule Errors ==========
    /// Withdrawal or loan payoff exceeds what the balance allows.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount the operation needed.
        requested: Decimal,
        /// Balance at the time of the check.
        available: Decimal,
    },

    /// The account already holds the maximum number of approved loans.
    #[error("Loan limit reached: at most {limit} approved loans per account")]
    LoanLimitExceeded {
        /// The configured cap.
        limit: u32,
    },

    /// The loan has not been approved yet.
    #[error("Loan {0} has not been approved")]
    LoanNotApproved(TransactionId),

    /// The loan was already approved.
    #[error("Loan {0} is already approved")]
    LoanAlreadyApproved(TransactionId),

    /// The record is not an open loan request.
    #[error("Transaction {0} is not an open loan request")]
    NotALoanRequest(TransactionId),

    /// Account owners cannot approve their own loans.
    #[error("Loans on account {0} cannot be approved by its owner")]
    SelfApproval(AccountId),

    // ========== Access Errors ==========
    /// The caller does not own the account.
    #[error("Account {0} does not belong to the current user")]
    NotAccountOwner(AccountId),

    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The user has no account yet.
    #[error("No account found for user {0}")]
    NoAccountForUser(UserId),

    /// The user already has an account.
    #[error("User {0} already has an account")]
    AccountAlreadyExists(UserId),

    /// Transaction not found on the account.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Consistency Errors ==========
    /// The account changed between read and write.
    #[error("Concurrent modification detected for account {0}, please retry")]
    ConcurrentModification(AccountId),

    /// Replaying the ledger does not reproduce the stored balance.
    #[error("Ledger for account {account_id} does not reconcile: balance {expected}, replayed {replayed}")]
    LedgerMismatch {
        /// The account checked.
        account_id: AccountId,
        /// The stored balance.
        expected: Decimal,
        /// The replayed or last recorded balance.
        replayed: Decimal,
    },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code reported to callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::LoanLimitExceeded { .. } => "LOAN_LIMIT_EXCEEDED",
            Self::LoanNotApproved(_) => "LOAN_NOT_APPROVED",
            Self::LoanAlreadyApproved(_) => "LOAN_ALREADY_APPROVED",
            Self::NotALoanRequest(_) => "NOT_A_LOAN_REQUEST",
            Self::SelfApproval(_) => "SELF_APPROVAL",
            Self::NotAccountOwner(_) => "NOT_ACCOUNT_OWNER",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::NoAccountForUser(_) => "NO_ACCOUNT_FOR_USER",
            Self::AccountAlreadyExists(_) => "ACCOUNT_ALREADY_EXISTS",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::LedgerMismatch { .. } => "LEDGER_MISMATCH",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }

    /// Returns true if the message is safe to show to the customer.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::LedgerMismatch { .. })
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InvalidAmount { .. } => Self::Validation(message),
            LedgerError::InsufficientFunds { .. }
            | LedgerError::LoanLimitExceeded { .. }
            | LedgerError::LoanNotApproved(_)
            | LedgerError::LoanAlreadyApproved(_)
            | LedgerError::NotALoanRequest(_) => Self::BusinessRule(message),
            LedgerError::SelfApproval(_) | LedgerError::NotAccountOwner(_) => {
                Self::Forbidden(message)
            }
            LedgerError::AccountNotFound(_)
            | LedgerError::NoAccountForUser(_)
            | LedgerError::TransactionNotFound(_) => Self::NotFound(message),
            LedgerError::AccountAlreadyExists(_) | LedgerError::ConcurrentModification(_) => {
                Self::Conflict(message)
            }
            LedgerError::Storage(_) => Self::Database(message),
            LedgerError::LedgerMismatch { .. } => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InsufficientFunds {
                requested: dec!(200),
                available: dec!(150),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            LedgerError::LoanLimitExceeded { limit: 3 }.error_code(),
            "LOAN_LIMIT_EXCEEDED"
        );
        assert_eq!(
            LedgerError::InvalidAmount {
                amount: dec!(0),
                reason: "must be positive",
            }
            .error_code(),
            "INVALID_AMOUNT"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrentModification(AccountId::new()).is_retryable());
        assert!(!LedgerError::LoanLimitExceeded { limit: 3 }.is_retryable());
        assert!(!LedgerError::Storage("down".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            requested: dec!(200.00),
            available: dec!(150.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 200.00, available 150.00"
        );
        assert_eq!(
            LedgerError::LoanLimitExceeded { limit: 3 }.to_string(),
            "Loan limit reached: at most 3 approved loans per account"
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::LoanLimitExceeded { limit: 3 }.into();
        assert_eq!(app.error_code(), "BUSINESS_RULE_VIOLATION");

        let app: AppError = LedgerError::NotAccountOwner(AccountId::new()).into();
        assert_eq!(app.error_code(), "FORBIDDEN");

        let app: AppError = LedgerError::Storage("connection reset".into()).into();
        assert_eq!(app.error_code(), "DATABASE_ERROR");
        assert!(!app.is_client_error());
    }
}
