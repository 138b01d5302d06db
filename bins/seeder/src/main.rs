//! Demo seeder for Bankroll development.
//!
//! Opens an account for a fixed demo customer and runs it through a deposit,
//! a withdrawal, a loan request, its approval and its payoff, printing the
//! customer notice for each step and the recent history at the end.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use bankroll_core::ledger::{
    Account, AuthenticatedUser, LedgerError, Notice, Teller, Transaction,
};
use bankroll_db::PgLedgerRepository;
use bankroll_shared::AppConfig;
use bankroll_shared::telemetry::init_tracing;
use bankroll_shared::types::UserId;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Demo customer ID (stable across runs)
const DEMO_CUSTOMER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Demo staff member approving loans
const DEMO_STAFF_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    println!("Connecting to database...");
    let db = bankroll_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    let teller = Teller::new(Arc::new(PgLedgerRepository::new(db)), &config.ledger);
    let customer = AuthenticatedUser::new(UserId::from_uuid(DEMO_CUSTOMER_ID));
    let staff = AuthenticatedUser::new(UserId::from_uuid(DEMO_STAFF_ID));

    println!("Opening demo account...");
    let account = open_or_reuse(&teller, &customer).await?;
    println!("  account {} balance {}", account.id, account.balance);

    println!("Walking the ledger...");
    let outcome = teller
        .deposit(&customer, account.id, Decimal::new(150_000, 2))
        .await;
    report(&teller, &outcome);

    let outcome = teller
        .withdraw(&customer, account.id, Decimal::new(20_000, 2))
        .await;
    report(&teller, &outcome);

    let loan = teller
        .request_loan(&customer, account.id, Decimal::new(50_000, 2))
        .await;
    report(&teller, &loan);

    if let Ok(loan) = loan {
        let approved = teller.approve_loan(&staff, account.id, loan.id).await;
        report(&teller, &approved);

        let paid = teller.pay_loan(&customer, account.id, loan.id).await;
        report(&teller, &paid);
    }

    println!("Recent history:");
    for record in teller.recent(&customer, account.id, None).await? {
        println!(
            "  {} {:<12} {:>12} -> {:>12}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.transaction_type.as_str(),
            record.amount,
            record.balance_after
        );
    }

    let balance = teller
        .verify(&customer, account.id)
        .await
        .context("Ledger does not reconcile")?;
    println!("Ledger verified, balance {balance}");
    println!("Seeding complete!");
    Ok(())
}

async fn open_or_reuse(
    teller: &Teller<PgLedgerRepository>,
    customer: &AuthenticatedUser,
) -> anyhow::Result<Account> {
    match teller.open_account(customer).await {
        Ok(account) => Ok(account),
        Err(LedgerError::AccountAlreadyExists(_)) => teller
            .account_for(customer)
            .await
            .context("Failed to load existing demo account"),
        Err(err) => Err(err).context("Failed to open demo account"),
    }
}

fn report(teller: &Teller<PgLedgerRepository>, outcome: &Result<Transaction, LedgerError>) {
    let Notice { level, message } = teller.notice(outcome);
    println!("  [{level:?}] {message}");
}
