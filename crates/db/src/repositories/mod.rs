//! Repository implementations for data access.
//!
//! Repositories hide the `SeaORM` details behind the storage traits defined
//! in the core crate.

pub mod ledger;

pub use ledger::PgLedgerRepository;
