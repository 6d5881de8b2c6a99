use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money added to the account
    Deposit,
    /// Money taken out of the account
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }

    /// Single-letter tag used in compact listings.
    pub fn code(&self) -> char {
        match self {
            TransactionKind::Deposit => 'D',
            TransactionKind::Withdrawal => 'W',
        }
    }

    /// Signed effect of a transaction of this kind on the balance.
    pub fn signed(&self, amount_cents: Cents) -> Cents {
        match self {
            TransactionKind::Deposit => amount_cents,
            TransactionKind::Withdrawal => -amount_cents,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "Deposit"),
            TransactionKind::Withdrawal => write!(f, "Withdrawal"),
        }
    }
}

/// One deposit or withdrawal. Records are immutable once created; an undo
/// removes the record rather than editing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    id: TransactionId,
    /// Ledger-wide creation order, never reused
    sequence: u64,
    kind: TransactionKind,
    /// Amount in cents (always positive)
    amount_cents: Cents,
    recorded_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a new record. The sequence number is assigned by the ledger.
    pub(crate) fn new(sequence: u64, kind: TransactionKind, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence,
            kind,
            amount_cents,
            recorded_at: Utc::now(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount_cents(&self) -> Cents {
        self.amount_cents
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Effect this record had on the balance when it was applied.
    pub fn balance_effect(&self) -> Cents {
        self.kind.signed(self.amount_cents)
    }
}
