//! `PostgreSQL` ledger repository.
//!
//! A save runs in one database transaction: a compare-and-swap update of the
//! account row keyed on its version, followed by the record insert or update.
//! If the account row was changed in the meantime, nothing is written.

use bankroll_core::ledger::{
    Account, LedgerError, LedgerRepository, LedgerWrite, Transaction, TransactionType, WriteKind,
};
use bankroll_shared::types::{AccountId, TransactionId, UserId};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, warn};

use crate::entities::{accounts, sea_orm_active_enums::TransactionKind, transactions};

impl From<TransactionType> for TransactionKind {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Deposit => Self::Deposit,
            TransactionType::Withdrawal => Self::Withdrawal,
            TransactionType::LoanRequest => Self::LoanRequest,
            TransactionType::LoanPayoff => Self::LoanPayoff,
        }
    }
}

impl From<TransactionKind> for TransactionType {
    fn from(value: TransactionKind) -> Self {
        match value {
            TransactionKind::Deposit => Self::Deposit,
            TransactionKind::Withdrawal => Self::Withdrawal,
            TransactionKind::LoanRequest => Self::LoanRequest,
            TransactionKind::LoanPayoff => Self::LoanPayoff,
        }
    }
}

fn storage(err: DbErr) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn account_from_model(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        owner_id: UserId::from_uuid(model.owner_id),
        balance: model.balance,
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn transaction_from_model(model: transactions::Model) -> Transaction {
    Transaction {
        id: TransactionId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        amount: model.amount,
        transaction_type: model.transaction_type.into(),
        balance_after: model.balance_after,
        account_version: model.account_version,
        loan_approved: model.loan_approved,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// Ledger repository backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgLedgerRepository {
    db: DatabaseConnection,
}

impl PgLedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl LedgerRepository for PgLedgerRepository {
    #[tracing::instrument(skip(self, account), fields(account_id = %account.id))]
    async fn create_account(&self, account: Account) -> Result<Account, LedgerError> {
        let model = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            owner_id: Set(account.owner_id.into_inner()),
            balance: Set(account.balance),
            version: Set(account.version),
            created_at: Set(account.created_at.into()),
            updated_at: Set(account.updated_at.into()),
        };

        match model.insert(&self.db).await {
            Ok(model) => Ok(account_from_model(model)),
            Err(err) if is_unique_violation(&err) => {
                Err(LedgerError::AccountAlreadyExists(account.owner_id))
            }
            Err(err) => Err(storage(err)),
        }
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map(|model| model.map(account_from_model))
            .map_err(storage)
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await
            .map(|model| model.map(account_from_model))
            .map_err(storage)
    }

    async fn find_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .one(&self.db)
            .await
            .map(|model| model.map(transaction_from_model))
            .map_err(storage)
    }

    async fn count_approved_loans(&self, account_id: AccountId) -> Result<u32, LedgerError> {
        let count = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .filter(transactions::Column::TransactionType.eq(TransactionKind::LoanRequest))
            .filter(transactions::Column::LoanApproved.eq(true))
            .count(&self.db)
            .await
            .map_err(storage)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn recent(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let limit = u64::try_from(limit).unwrap_or(u64::MAX);
        let models = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::AccountVersion)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(storage)?;
        Ok(models.into_iter().map(transaction_from_model).collect())
    }

    async fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::AccountVersion)
            .all(&self.db)
            .await
            .map_err(storage)?;
        Ok(models.into_iter().map(transaction_from_model).collect())
    }

    #[tracing::instrument(
        skip(self, write),
        fields(
            account_id = %write.account.id,
            transaction_id = %write.transaction.id,
            expected_version = write.expected_version
        )
    )]
    async fn save(&self, write: &LedgerWrite) -> Result<(), LedgerError> {
        let account_id = write.account.id;
        let record = &write.transaction;

        let txn = self.db.begin().await.map_err(storage)?;

        // Compare-and-swap on the account version
        let swapped = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(write.account.balance))
            .col_expr(accounts::Column::Version, Expr::value(write.account.version))
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(write.account.updated_at),
            )
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .filter(accounts::Column::Version.eq(write.expected_version))
            .exec(&txn)
            .await
            .map_err(storage)?;

        if swapped.rows_affected == 0 {
            txn.rollback().await.map_err(storage)?;
            warn!("Account version moved, write discarded");
            return Err(LedgerError::ConcurrentModification(account_id));
        }

        let written = match write.kind {
            WriteKind::Insert => {
                let model = transactions::ActiveModel {
                    id: Set(record.id.into_inner()),
                    account_id: Set(record.account_id.into_inner()),
                    amount: Set(record.amount),
                    transaction_type: Set(record.transaction_type.into()),
                    balance_after: Set(record.balance_after),
                    account_version: Set(record.account_version),
                    loan_approved: Set(record.loan_approved),
                    created_at: Set(record.created_at.into()),
                    updated_at: Set(record.updated_at.into()),
                };
                model.insert(&txn).await.map(|_| 1)
            }
            WriteKind::Update => transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::TransactionType,
                    TransactionKind::from(record.transaction_type).as_enum(),
                )
                .col_expr(
                    transactions::Column::BalanceAfter,
                    Expr::value(record.balance_after),
                )
                .col_expr(
                    transactions::Column::AccountVersion,
                    Expr::value(record.account_version),
                )
                .col_expr(
                    transactions::Column::LoanApproved,
                    Expr::value(record.loan_approved),
                )
                .col_expr(transactions::Column::UpdatedAt, Expr::value(record.updated_at))
                .filter(transactions::Column::Id.eq(record.id.into_inner()))
                .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
                .exec(&txn)
                .await
                .map(|result| result.rows_affected),
        };

        match written {
            Ok(0) => {
                txn.rollback().await.map_err(storage)?;
                Err(LedgerError::TransactionNotFound(record.id))
            }
            Ok(_) => {
                txn.commit().await.map_err(storage)?;
                debug!(version = write.account.version, "Ledger write stored");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await.map_err(storage)?;
                Err(LedgerError::ConcurrentModification(account_id))
            }
            Err(err) => {
                txn.rollback().await.map_err(storage)?;
                Err(storage(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping_round_trips() {
        for kind in [
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::LoanRequest,
            TransactionType::LoanPayoff,
        ] {
            assert_eq!(TransactionType::from(TransactionKind::from(kind)), kind);
        }
    }

    #[test]
    fn test_db_errors_map_to_storage() {
        let err = storage(DbErr::Custom("connection refused".into()));
        assert!(matches!(&err, LedgerError::Storage(msg) if msg.contains("connection refused")));
        assert!(!err.is_user_facing());
    }
}
