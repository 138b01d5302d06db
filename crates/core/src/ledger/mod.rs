//! Account-transaction ledger.
//!
//! This module implements the ledger core:
//! - Account and transaction records
//! - Amount validation
//! - Loan policy (approved-loan cap, payoff balance check)
//! - Ledger service deciding each write
//! - History projection and ledger replay
//! - Customer-facing notices
//! - Repository trait with an in-memory implementation
//! - Teller orchestrating reads, decisions and atomic saves per account

pub mod error;
pub mod history;
pub mod locks;
pub mod memory;
pub mod notice;
pub mod policy;
pub mod repository;
pub mod service;
pub mod teller;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use history::{recent, replay_balance, verify_ledger};
pub use locks::{AccountGuard, AccountLocks};
pub use memory::InMemoryLedgerRepository;
pub use notice::{Notice, NoticeLevel};
pub use policy::LoanPolicy;
pub use repository::LedgerRepository;
pub use service::LedgerService;
pub use teller::Teller;
pub use types::{
    Account, AuthenticatedUser, LedgerOperation, LedgerWrite, Transaction, TransactionType,
    WriteKind,
};
pub use validation::validate_amount;
