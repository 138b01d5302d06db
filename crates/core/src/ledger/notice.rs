//! Customer-facing notices for ledger outcomes.

use bankroll_shared::types::format_amount;
use serde::Serialize;

use super::error::LedgerError;
use super::types::{Transaction, TransactionType};

const GENERIC_FAILURE: &str =
    "Something went wrong while processing your request. Please try again.";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// The operation went through.
    Success,
    /// The operation was rejected.
    Error,
}

/// A message for the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the customer.
    pub message: String,
}

impl Notice {
    /// Success notice for a committed record.
    #[must_use]
    pub fn for_transaction(transaction: &Transaction, currency: &str) -> Self {
        let amount = format!("{currency} {}", format_amount(transaction.amount));
        let message = match transaction.transaction_type {
            TransactionType::Deposit => {
                format!("{amount} was deposited to your account successfully")
            }
            TransactionType::Withdrawal => {
                format!("Successfully withdrawn {amount} from your account")
            }
            TransactionType::LoanRequest if transaction.loan_approved => {
                format!("Loan request for {amount} has been approved")
            }
            TransactionType::LoanRequest => {
                format!("Loan request for {amount} submitted successfully")
            }
            TransactionType::LoanPayoff => format!("Loan of {amount} paid off successfully"),
        };
        Self {
            level: NoticeLevel::Success,
            message,
        }
    }

    /// Error notice for a rejected operation.
    ///
    /// Internal failures are reported with a generic message.
    #[must_use]
    pub fn for_error(error: &LedgerError, currency: &str) -> Self {
        let message = match error {
            LedgerError::InsufficientFunds {
                requested,
                available,
            } => format!(
                "Insufficient funds: {currency} {} requested, {currency} {} available",
                format_amount(*requested),
                format_amount(*available)
            ),
            err if err.is_user_facing() => err.to_string(),
            _ => GENERIC_FAILURE.to_owned(),
        };
        Self {
            level: NoticeLevel::Error,
            message,
        }
    }
}
