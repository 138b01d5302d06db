//! `SeaORM` active enums mirroring `PostgreSQL` enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of ledger record (`transaction_kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
pub enum TransactionKind {
    /// Cash paid in.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Cash taken out.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Loan awaiting approval or payoff.
    #[sea_orm(string_value = "loan_request")]
    LoanRequest,
    /// Loan settled from the balance.
    #[sea_orm(string_value = "loan_payoff")]
    LoanPayoff,
}
