//! Ledger migration.
//!
//! Creates the accounts and transactions tables, the transaction kind enum,
//! and the trigger guarding transaction records against illegal edits.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(GUARD_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE transaction_kind AS ENUM (
    'deposit',
    'withdrawal',
    'loan_request',
    'loan_payoff'
);
";

const ACCOUNTS_SQL: &str = r"
-- One account per user; the user itself lives in the auth service
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_owner UNIQUE (owner_id),
    CONSTRAINT chk_accounts_balance_non_negative CHECK (balance >= 0),
    CONSTRAINT chk_accounts_version_non_negative CHECK (version >= 0)
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    amount NUMERIC(12, 2) NOT NULL,
    transaction_type transaction_kind NOT NULL,
    balance_after NUMERIC(14, 2) NOT NULL,
    account_version BIGINT NOT NULL,
    loan_approved BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transactions_amount_positive CHECK (amount > 0),
    CONSTRAINT uq_transactions_account_version UNIQUE (account_id, account_version)
);

-- Recent history (most common read)
CREATE INDEX idx_transactions_recent
    ON transactions(account_id, created_at DESC, account_version DESC);

-- Approved, unpaid loans per account
CREATE INDEX idx_transactions_approved_loans ON transactions(account_id)
    WHERE transaction_type = 'loan_request' AND loan_approved;
";

const GUARD_SQL: &str = r"
-- ============================================================
-- FUNCTION: guard_transaction_update
-- Records are append-only except loan approval and payoff
-- ============================================================
CREATE OR REPLACE FUNCTION guard_transaction_update()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.id <> OLD.id
        OR NEW.account_id <> OLD.account_id
        OR NEW.amount <> OLD.amount
        OR NEW.created_at <> OLD.created_at THEN
        RAISE EXCEPTION 'Transaction % is immutable', OLD.id;
    END IF;

    IF OLD.loan_approved AND NOT NEW.loan_approved THEN
        RAISE EXCEPTION 'Loan % cannot be un-approved', OLD.id;
    END IF;

    IF NEW.transaction_type <> OLD.transaction_type
        AND NOT (OLD.transaction_type = 'loan_request'
            AND NEW.transaction_type = 'loan_payoff') THEN
        RAISE EXCEPTION 'Transaction % cannot change type from % to %',
            OLD.id, OLD.transaction_type, NEW.transaction_type;
    END IF;

    IF NEW.transaction_type = OLD.transaction_type
        AND (NEW.balance_after <> OLD.balance_after
            OR NEW.account_version <> OLD.account_version) THEN
        RAISE EXCEPTION 'Transaction % balance snapshot is immutable', OLD.id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_guard_transaction_update
BEFORE UPDATE ON transactions
FOR EACH ROW
EXECUTE FUNCTION guard_transaction_update();

CREATE OR REPLACE FUNCTION prevent_transaction_delete()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Transaction % cannot be deleted', OLD.id;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_transaction_delete
BEFORE DELETE ON transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_transaction_delete();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP FUNCTION IF EXISTS guard_transaction_update();
DROP FUNCTION IF EXISTS prevent_transaction_delete();
DROP TYPE IF EXISTS transaction_kind;
";
