//! Core ledger logic for Bankroll.
//!
//! This crate contains the account-transaction ledger with ZERO web or
//! database dependencies. Storage is reached through the
//! [`ledger::LedgerRepository`] trait, implemented in-memory here and on
//! PostgreSQL by the db crate.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transaction records, loan policy and the teller

pub mod ledger;
