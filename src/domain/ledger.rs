use std::collections::TryReserveError;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{format_cents, Cents, TransactionHistory, TransactionKind, TransactionRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid amount: {kind} of {} must be greater than zero", format_cents(*.amount))]
    InvalidAmount { kind: TransactionKind, amount: Cents },

    #[error("Insufficient funds: balance {}, requested {}", format_cents(*.balance), format_cents(*.requested))]
    InsufficientFunds { balance: Cents, requested: Cents },

    #[error("Balance overflow: {kind} of {} cannot be applied to {}", format_cents(*.amount), format_cents(*.balance))]
    BalanceOverflow {
        kind: TransactionKind,
        amount: Cents,
        balance: Cents,
    },

    #[error("No transactions in history")]
    EmptyHistory,

    #[error("Transaction not recorded: {0}")]
    AllocationFailure(#[from] TryReserveError),

    #[error("Opening balance cannot be negative: {}", format_cents(*.0))]
    InvalidOpeningBalance(Cents),
}

/// Outcome of a successful undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undone {
    /// The record that was removed from the history
    pub record: TransactionRecord,
    /// Balance after the record's effect was reversed
    pub balance: Cents,
}

/// The single account: a running balance plus the history that explains it.
///
/// Invariant: `balance == opening_balance + deposits - withdrawals` over the
/// records currently in the history, and `balance >= 0`.
#[derive(Debug)]
pub struct Ledger {
    opening_balance: Cents,
    balance: Cents,
    next_sequence: u64,
    history: TransactionHistory,
}

impl Ledger {
    /// Open the account with the given starting balance.
    pub fn new(opening_balance: Cents) -> Result<Self, LedgerError> {
        if opening_balance < 0 {
            return Err(LedgerError::InvalidOpeningBalance(opening_balance));
        }
        info!(
            opening_balance = %format_cents(opening_balance),
            "ledger opened"
        );
        Ok(Self {
            opening_balance,
            balance: opening_balance,
            next_sequence: 1,
            history: TransactionHistory::new(),
        })
    }

    /// Add money to the account. Returns the new balance.
    pub fn deposit(&mut self, amount: Cents) -> Result<Cents, LedgerError> {
        let kind = TransactionKind::Deposit;
        validate_amount(kind, amount)?;

        let new_balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| self.overflow(kind, amount))?;

        self.record(kind, amount, new_balance)
    }

    /// Take money out of the account. Returns the new balance.
    ///
    /// Withdrawing the whole balance is allowed; going below zero is not.
    pub fn withdraw(&mut self, amount: Cents) -> Result<Cents, LedgerError> {
        let kind = TransactionKind::Withdrawal;
        validate_amount(kind, amount)?;

        if amount > self.balance {
            warn!(
                balance = %format_cents(self.balance),
                requested = %format_cents(amount),
                "withdrawal rejected: insufficient funds"
            );
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }

        self.record(kind, amount, self.balance - amount)
    }

    /// The most recent transaction still in the history.
    pub fn view_last(&self) -> Option<&TransactionRecord> {
        self.history.peek()
    }

    /// Remove the most recent transaction and reverse its effect on the balance.
    pub fn undo_last(&mut self) -> Result<Undone, LedgerError> {
        let record = self.history.pop().ok_or_else(|| {
            debug!("undo requested with empty history");
            LedgerError::EmptyHistory
        })?;

        // Lands on the balance held before the record was applied; cannot overflow.
        self.balance -= record.balance_effect();

        info!(
            sequence = record.sequence(),
            kind = record.kind().as_str(),
            amount = %format_cents(record.amount_cents()),
            balance = %format_cents(self.balance),
            "transaction undone"
        );

        Ok(Undone {
            record,
            balance: self.balance,
        })
    }

    pub fn current_balance(&self) -> Cents {
        self.balance
    }

    pub fn opening_balance(&self) -> Cents {
        self.opening_balance
    }

    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    /// Recompute the balance from the history and compare it with the tracked one.
    pub fn check_integrity(&self) -> IntegrityReport {
        let computed = compute_balance(self.opening_balance, &self.history);
        let mut issues = Vec::new();

        match computed {
            Some(computed) if computed != self.balance => issues.push(format!(
                "Tracked balance {} does not match history ({})",
                format_cents(self.balance),
                format_cents(computed)
            )),
            Some(_) => {}
            None => issues.push("History sum overflows".to_string()),
        }
        if self.balance < 0 {
            issues.push(format!(
                "Balance is negative: {}",
                format_cents(self.balance)
            ));
        }
        if self
            .history
            .iter()
            .any(|record| record.sequence() >= self.next_sequence)
        {
            issues.push("History contains an unassigned sequence number".to_string());
        }

        IntegrityReport {
            opening_balance: self.opening_balance,
            tracked_balance: self.balance,
            computed_balance: computed,
            transaction_count: self.history.len(),
            issues,
        }
    }

    /// Close the account, releasing the ledger and every record it holds.
    /// Returns how many records were released.
    pub fn close(self) -> usize {
        let released = self.history.len();
        info!(
            released,
            balance = %format_cents(self.balance),
            "ledger closed"
        );
        released
    }

    /// Push the record for an already-validated mutation, then commit the
    /// new balance. Nothing changes if the record cannot be stored.
    fn record(
        &mut self,
        kind: TransactionKind,
        amount: Cents,
        new_balance: Cents,
    ) -> Result<Cents, LedgerError> {
        let record = TransactionRecord::new(self.next_sequence, kind, amount);
        if let Err(err) = self.history.push(record) {
            warn!(kind = kind.as_str(), error = %err, "transaction not recorded");
            return Err(err.into());
        }

        self.next_sequence += 1;
        self.balance = new_balance;

        debug!(
            kind = kind.as_str(),
            amount = %format_cents(amount),
            balance = %format_cents(new_balance),
            "transaction recorded"
        );
        Ok(new_balance)
    }

    fn overflow(&self, kind: TransactionKind, amount: Cents) -> LedgerError {
        LedgerError::BalanceOverflow {
            kind,
            amount,
            balance: self.balance,
        }
    }
}

fn validate_amount(kind: TransactionKind, amount: Cents) -> Result<(), LedgerError> {
    if amount <= 0 {
        debug!(kind = kind.as_str(), amount, "rejected non-positive amount");
        return Err(LedgerError::InvalidAmount { kind, amount });
    }
    Ok(())
}

/// Compute the balance implied by an opening balance and a history.
/// Balance = opening + sum of deposits - sum of withdrawals.
/// Records are replayed oldest first, so every intermediate value is a
/// balance the ledger actually held. Returns `None` if a step does not fit
/// in `Cents`.
pub fn compute_balance(opening_balance: Cents, history: &TransactionHistory) -> Option<Cents> {
    history
        .iter_chronological()
        .try_fold(opening_balance, |balance, record| {
            balance.checked_add(record.balance_effect())
        })
}

/// Result of [`Ledger::check_integrity`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub opening_balance: Cents,
    pub tracked_balance: Cents,
    pub computed_balance: Option<Cents>,
    pub transaction_count: usize,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(opening: Cents) -> Ledger {
        Ledger::new(opening).unwrap()
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = ledger(100000);
        assert_eq!(ledger.current_balance(), 100000);
        assert_eq!(ledger.opening_balance(), 100000);
        assert!(ledger.view_last().is_none());
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn test_negative_opening_balance_rejected() {
        let result = Ledger::new(-1);
        assert!(matches!(result, Err(LedgerError::InvalidOpeningBalance(-1))));
    }

    #[test]
    fn test_zero_opening_balance_allowed() {
        assert_eq!(ledger(0).current_balance(), 0);
    }

    #[test]
    fn test_deposit_increases_balance_and_records() {
        let mut ledger = ledger(100000);
        assert_eq!(ledger.deposit(50000), Ok(150000));

        let last = ledger.view_last().unwrap();
        assert_eq!(last.kind(), TransactionKind::Deposit);
        assert_eq!(last.amount_cents(), 50000);
        assert_eq!(last.sequence(), 1);
    }

    #[test]
    fn test_withdraw_decreases_balance_and_records() {
        let mut ledger = ledger(100000);
        assert_eq!(ledger.withdraw(25000), Ok(75000));

        let last = ledger.view_last().unwrap();
        assert_eq!(last.kind(), TransactionKind::Withdrawal);
        assert_eq!(last.amount_cents(), 25000);
    }

    #[test]
    fn test_non_positive_amounts_leave_no_trace() {
        let mut ledger = ledger(100000);
        for amount in [0, -1, -50000] {
            assert_eq!(
                ledger.deposit(amount),
                Err(LedgerError::InvalidAmount {
                    kind: TransactionKind::Deposit,
                    amount
                })
            );
            assert_eq!(
                ledger.withdraw(amount),
                Err(LedgerError::InvalidAmount {
                    kind: TransactionKind::Withdrawal,
                    amount
                })
            );
        }
        assert_eq!(ledger.current_balance(), 100000);
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn test_withdraw_more_than_balance_rejected() {
        let mut ledger = ledger(150000);
        let result = ledger.withdraw(200000);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                balance: 150000,
                requested: 200000
            })
        );
        assert_eq!(ledger.current_balance(), 150000);
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn test_exact_drain_then_one_cent_rejected() {
        let mut ledger = ledger(100000);
        assert_eq!(ledger.withdraw(100000), Ok(0));
        assert!(matches!(
            ledger.withdraw(1),
            Err(LedgerError::InsufficientFunds {
                balance: 0,
                requested: 1
            })
        ));
        assert_eq!(ledger.current_balance(), 0);
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn test_deposit_overflow_rejected() {
        let mut ledger = ledger(Cents::MAX - 10);
        assert!(matches!(
            ledger.deposit(11),
            Err(LedgerError::BalanceOverflow { .. })
        ));
        assert_eq!(ledger.current_balance(), Cents::MAX - 10);
        assert!(ledger.history().is_empty());
        assert_eq!(ledger.deposit(10), Ok(Cents::MAX));
    }

    #[test]
    fn test_undo_reverses_deposit() {
        let mut ledger = ledger(100000);
        ledger.deposit(50000).unwrap();

        let undone = ledger.undo_last().unwrap();
        assert_eq!(undone.record.kind(), TransactionKind::Deposit);
        assert_eq!(undone.record.amount_cents(), 50000);
        assert_eq!(undone.balance, 100000);
        assert_eq!(ledger.current_balance(), 100000);
        assert!(ledger.history().is_empty());
    }

    #[test]
    fn test_undo_reverses_withdrawal() {
        let mut ledger = ledger(100000);
        ledger.withdraw(30000).unwrap();

        let undone = ledger.undo_last().unwrap();
        assert_eq!(undone.record.kind(), TransactionKind::Withdrawal);
        assert_eq!(undone.balance, 100000);
    }

    #[test]
    fn test_undo_walks_back_in_lifo_order() {
        let mut ledger = ledger(100000);
        ledger.deposit(10000).unwrap(); // 110000
        ledger.withdraw(5000).unwrap(); // 105000
        ledger.deposit(2500).unwrap(); // 107500

        assert_eq!(ledger.undo_last().unwrap().balance, 105000);
        assert_eq!(
            ledger.view_last().map(|r| r.kind()),
            Some(TransactionKind::Withdrawal)
        );
        assert_eq!(ledger.undo_last().unwrap().balance, 110000);
        assert_eq!(ledger.undo_last().unwrap().balance, 100000);
        assert_eq!(ledger.undo_last(), Err(LedgerError::EmptyHistory));
        assert_eq!(ledger.current_balance(), 100000);
    }

    #[test]
    fn test_undo_on_empty_history_is_reported() {
        let mut ledger = ledger(5000);
        for _ in 0..3 {
            assert_eq!(ledger.undo_last(), Err(LedgerError::EmptyHistory));
        }
        assert_eq!(ledger.current_balance(), 5000);
    }

    #[test]
    fn test_sequence_numbers_not_reused_after_undo() {
        let mut ledger = ledger(0);
        ledger.deposit(100).unwrap();
        ledger.undo_last().unwrap();
        ledger.deposit(100).unwrap();

        assert_eq!(ledger.view_last().unwrap().sequence(), 2);
    }

    #[test]
    fn test_close_reports_released_records() {
        let mut ledger = ledger(1000);
        ledger.deposit(1).unwrap();
        ledger.withdraw(2).unwrap();
        assert_eq!(ledger.close(), 2);
    }

    #[test]
    fn test_compute_balance_from_history() {
        let mut ledger = ledger(1000);
        ledger.deposit(500).unwrap();
        ledger.withdraw(300).unwrap();
        ledger.deposit(50).unwrap();

        assert_eq!(compute_balance(1000, ledger.history()), Some(1250));
        assert_eq!(compute_balance(0, &TransactionHistory::new()), Some(0));
    }

    #[test]
    fn test_integrity_report_healthy_near_max_balance() {
        let mut ledger = ledger(Cents::MAX);
        ledger.withdraw(Cents::MAX).unwrap();
        ledger.deposit(5).unwrap();

        let report = ledger.check_integrity();
        assert!(report.is_healthy(), "issues: {:?}", report.issues);
        assert_eq!(report.computed_balance, Some(5));
        assert_eq!(compute_balance(Cents::MAX, ledger.history()), Some(5));
    }

    #[test]
    fn test_integrity_report_healthy() {
        let mut ledger = ledger(100000);
        ledger.deposit(50000).unwrap();
        ledger.withdraw(150000).unwrap();
        ledger.undo_last().unwrap();

        let report = ledger.check_integrity();
        assert!(report.is_healthy(), "issues: {:?}", report.issues);
        assert_eq!(report.tracked_balance, 150000);
        assert_eq!(report.computed_balance, Some(150000));
        assert_eq!(report.transaction_count, 1);
    }

    #[test]
    fn test_integrity_report_detects_drift() {
        let mut ledger = ledger(100000);
        ledger.deposit(100).unwrap();
        ledger.balance += 1;

        let report = ledger.check_integrity();
        assert!(!report.is_healthy());
        assert_eq!(report.computed_balance, Some(100100));
        assert_eq!(report.tracked_balance, 100101);
    }

    #[test]
    fn test_error_messages() {
        let err = LedgerError::InsufficientFunds {
            balance: 150000,
            requested: 200000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: balance 1500.00, requested 2000.00"
        );
        let err = LedgerError::InvalidAmount {
            kind: TransactionKind::Deposit,
            amount: 0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid amount: Deposit of 0.00 must be greater than zero"
        );
    }
}
