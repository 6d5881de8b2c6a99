use thiserror::Error;

use crate::domain::{LedgerError, ParseAmountError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] ParseAmountError),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuChoiceError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{0} is not on the menu")]
    OutOfRange(i64),
}
