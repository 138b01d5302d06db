//! Loan policy.
//!
//! Two rules gate loans: an account may hold a limited number of approved,
//! unpaid loans, and a payoff must leave money in the account.

use bankroll_shared::LedgerConfig;
use rust_decimal::Decimal;

use super::types::{Account, Transaction};

/// Default cap on approved, unpaid loans per account.
pub const DEFAULT_MAX_APPROVED_LOANS: u32 = 3;

/// Loan rules evaluated before a loan request, approval or payoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    max_approved_loans: u32,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_APPROVED_LOANS)
    }
}

impl LoanPolicy {
    /// Creates a policy with the given approved-loan cap.
    #[must_use]
    pub const fn new(max_approved_loans: u32) -> Self {
        Self { max_approved_loans }
    }

    /// Creates a policy from ledger configuration.
    #[must_use]
    pub const fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.max_approved_loans)
    }

    /// The approved-loan cap.
    #[must_use]
    pub const fn max_approved_loans(&self) -> u32 {
        self.max_approved_loans
    }

    /// True while the account holds fewer approved loans than the cap.
    #[must_use]
    pub const fn can_request_loan(&self, approved_loans: u32) -> bool {
        approved_loans < self.max_approved_loans
    }

    /// True if the balance strictly exceeds the loan amount.
    ///
    /// An exact-balance payoff is refused.
    #[must_use]
    pub fn can_pay_loan(&self, account: &Account, loan_amount: Decimal) -> bool {
        loan_amount < account.balance
    }
}

/// Counts approved loan requests that have not been paid off.
#[must_use]
pub fn count_approved_loans(transactions: &[Transaction]) -> u32 {
    let count = transactions.iter().filter(|t| t.is_approved_loan()).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
