use std::collections::TryReserveError;
use std::iter::Rev;
use std::slice;

use super::TransactionRecord;

/// LIFO stack of transaction records.
///
/// Only the top (most recently pushed) record can be observed or removed.
/// Records are owned by the stack and released when it is dropped.
#[derive(Debug, Clone, Default)]
pub struct TransactionHistory {
    // Top of the stack is the last element
    records: Vec<TransactionRecord>,
}

impl TransactionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a record onto the stack, making it the new top.
    ///
    /// Storage is reserved up front so an allocation failure leaves the
    /// stack untouched and is reported instead of aborting.
    pub fn push(&mut self, record: TransactionRecord) -> Result<(), TryReserveError> {
        self.records.try_reserve(1)?;
        self.records.push(record);
        Ok(())
    }

    /// The top record, if any.
    pub fn peek(&self) -> Option<&TransactionRecord> {
        self.records.last()
    }

    /// Remove and return the top record. The record below it becomes the top.
    pub fn pop(&mut self) -> Option<TransactionRecord> {
        self.records.pop()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records from most recent to oldest.
    pub fn iter(&self) -> Rev<slice::Iter<'_, TransactionRecord>> {
        self.records.iter().rev()
    }

    /// Records in the order they were applied, oldest first.
    pub fn iter_chronological(&self) -> slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a TransactionHistory {
    type Item = &'a TransactionRecord;
    type IntoIter = Rev<slice::Iter<'a, TransactionRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
