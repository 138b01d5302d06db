//! Integration tests for the transaction guard trigger.
//!
//! These tests verify that `PostgreSQL` rejects edits the ledger never
//! makes, even if application logic fails.

#![allow(clippy::unwrap_used)]

mod common;

use bankroll_core::ledger::{Account, LedgerRepository, LedgerService, LoanPolicy};
use bankroll_db::PgLedgerRepository;
use bankroll_db::entities::{sea_orm_active_enums::TransactionKind, transactions};
use bankroll_shared::types::UserId;
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};

async fn account_with_deposit(db: &DatabaseConnection) -> (Account, transactions::Model) {
    let repo = PgLedgerRepository::new(db.clone());
    let account = repo
        .create_account(Account::open(UserId::new(), Utc::now()))
        .await
        .unwrap();
    let write = LedgerService::deposit(&account, dec!(100.00), Utc::now()).unwrap();
    repo.save(&write).await.unwrap();

    let model = transactions::Entity::find_by_id(write.transaction.id.into_inner())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    (write.account, model)
}

#[tokio::test]
async fn test_trigger_rejects_amount_change() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (_, record) = account_with_deposit(&db).await;

    let mut model: transactions::ActiveModel = record.into();
    model.amount = Set(dec!(1.00));
    let result = model.update(&db).await;
    assert!(result.is_err(), "amount edit should be rejected");
}

#[tokio::test]
async fn test_trigger_rejects_type_change_other_than_payoff() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (_, record) = account_with_deposit(&db).await;

    let mut model: transactions::ActiveModel = record.into();
    model.transaction_type = Set(TransactionKind::Withdrawal);
    assert!(model.update(&db).await.is_err());
}

#[tokio::test]
async fn test_trigger_rejects_unapproving() {
    let Some(db) = common::connect().await else {
        return;
    };
    let repo = PgLedgerRepository::new(db.clone());
    let (account, _) = account_with_deposit(&db).await;

    let policy = LoanPolicy::default();
    let request =
        LedgerService::request_loan(&account, dec!(50.00), 0, &policy, Utc::now()).unwrap();
    repo.save(&request).await.unwrap();
    let approve = LedgerService::approve_loan(
        &request.account,
        &request.transaction,
        0,
        &policy,
        Utc::now(),
    )
    .unwrap();
    repo.save(&approve).await.unwrap();

    let stored = transactions::Entity::find_by_id(request.transaction.id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.loan_approved);

    let mut model: transactions::ActiveModel = stored.into();
    model.loan_approved = Set(false);
    assert!(model.update(&db).await.is_err());
}

#[tokio::test]
async fn test_trigger_rejects_delete() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (_, record) = account_with_deposit(&db).await;

    let result = transactions::Entity::delete_by_id(record.id).exec(&db).await;
    assert!(result.is_err());
}
