//! Property-based tests for LedgerService.
//!
//! - Property 1: Replay reproduces the balance after any operation sequence
//! - Property 2: The balance never goes negative
//! - Property 3: Approved loans never exceed the cap
//! - Property 4: Rejected operations change nothing

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use bankroll_shared::types::UserId;

use super::error::LedgerError;
use super::history::{replay_balance, verify_ledger};
use super::policy::{LoanPolicy, count_approved_loans};
use super::service::LedgerService;
use super::types::{Account, LedgerWrite, Transaction, WriteKind};

#[derive(Debug, Clone)]
enum Op {
    Deposit(Decimal),
    Withdraw(Decimal),
    RequestLoan(Decimal),
    Approve(usize),
    Pay(usize),
}

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => positive_amount().prop_map(Op::Deposit),
        2 => positive_amount().prop_map(Op::Withdraw),
        1 => positive_amount().prop_map(Op::RequestLoan),
        1 => any::<usize>().prop_map(Op::Approve),
        1 => any::<usize>().prop_map(Op::Pay),
    ]
}

/// Minimal store applying writes the way a repository does.
struct Ledger {
    account: Account,
    records: Vec<Transaction>,
    policy: LoanPolicy,
}

impl Ledger {
    fn new() -> Self {
        Self {
            account: Account::open(UserId::new(), Utc::now()),
            records: Vec::new(),
            policy: LoanPolicy::default(),
        }
    }

    fn loan_at(&self, index: usize) -> Option<Transaction> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.records[index % self.records.len()].clone())
    }

    fn decide(&self, op: &Op) -> Option<Result<LedgerWrite, LedgerError>> {
        let now = Utc::now();
        let approved = count_approved_loans(&self.records);
        Some(match op {
            Op::Deposit(amount) => LedgerService::deposit(&self.account, *amount, now),
            Op::Withdraw(amount) => LedgerService::withdraw(&self.account, *amount, now),
            Op::RequestLoan(amount) => {
                LedgerService::request_loan(&self.account, *amount, approved, &self.policy, now)
            }
            Op::Approve(index) => LedgerService::approve_loan(
                &self.account,
                &self.loan_at(*index)?,
                approved,
                &self.policy,
                now,
            ),
            Op::Pay(index) => {
                LedgerService::pay_loan(&self.account, &self.loan_at(*index)?, &self.policy, now)
            }
        })
    }

    fn commit(&mut self, write: LedgerWrite) {
        assert_eq!(write.expected_version, self.account.version);
        match write.kind {
            WriteKind::Insert => self.records.push(write.transaction),
            WriteKind::Update => {
                let slot = self
                    .records
                    .iter_mut()
                    .find(|t| t.id == write.transaction.id)
                    .expect("updated record exists");
                *slot = write.transaction;
            }
        }
        self.account = write.account;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_replay_reproduces_balance(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut ledger = Ledger::new();
        for op in &ops {
            let before = (ledger.account.clone(), ledger.records.clone());
            match ledger.decide(op) {
                Some(Ok(write)) => {
                    prop_assert_eq!(write.account.version, ledger.account.version + 1);
                    ledger.commit(write);
                }
                Some(Err(err)) => {
                    prop_assert!(!err.is_retryable());
                    prop_assert_eq!(&before.0, &ledger.account);
                    prop_assert_eq!(&before.1, &ledger.records);
                }
                None => {}
            }

            prop_assert!(ledger.account.balance >= Decimal::ZERO);
            let cap = ledger.policy.max_approved_loans();
            prop_assert!(count_approved_loans(&ledger.records) <= cap);
            prop_assert_eq!(replay_balance(&ledger.records), ledger.account.balance);
            prop_assert_eq!(
                verify_ledger(&ledger.account, &ledger.records),
                Ok(ledger.account.balance)
            );
        }
    }

    #[test]
    fn prop_withdraw_is_bounded_by_balance(
        deposit in positive_amount(),
        withdraw in positive_amount(),
    ) {
        let mut ledger = Ledger::new();
        let write = LedgerService::deposit(&ledger.account, deposit, Utc::now()).unwrap();
        ledger.commit(write);

        let result = LedgerService::withdraw(&ledger.account, withdraw, Utc::now());
        if withdraw <= deposit {
            let write = result.unwrap();
            prop_assert_eq!(write.account.balance, deposit - withdraw);
            prop_assert_eq!(write.transaction.balance_after, deposit - withdraw);
        } else {
            prop_assert_eq!(
                result,
                Err(LedgerError::InsufficientFunds { requested: withdraw, available: deposit })
            );
        }
    }

    #[test]
    fn prop_payoff_requires_strictly_more(
        balance in positive_amount(),
        loan_amount in positive_amount(),
    ) {
        let mut ledger = Ledger::new();
        let write = LedgerService::deposit(&ledger.account, balance, Utc::now()).unwrap();
        ledger.commit(write);
        let policy = ledger.policy;
        let write =
            LedgerService::request_loan(&ledger.account, loan_amount, 0, &policy, Utc::now())
                .unwrap();
        let loan = write.transaction.clone();
        ledger.commit(write);
        let write =
            LedgerService::approve_loan(&ledger.account, &loan, 0, &policy, Utc::now()).unwrap();
        let loan = write.transaction.clone();
        ledger.commit(write);

        let result = LedgerService::pay_loan(&ledger.account, &loan, &policy, Utc::now());
        prop_assert_eq!(result.is_ok(), loan_amount < balance);
    }
}
