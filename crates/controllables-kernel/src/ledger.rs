//! Append-only call ledger and its point-in-time snapshots.

use std::ops::Index;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;

use crate::call::{CallRecord, CallSummary};
use crate::exit::Exit;
use crate::fault::CheckedFaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call ledger lock poisoned")]
pub struct LedgerPoisoned;

/// Every resolved call of one controlled method, in the order the calls started.
pub struct CallLedger<A, R, F> {
    records: Mutex<Vec<Arc<CallRecord<A, R, F>>>>,
}

impl<A, R, F> Default for CallLedger<A, R, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, F> CallLedger<A, R, F> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Records a call that is starting now. Sequence and timestamp are assigned under
    /// the ledger lock, so ledger order and timestamp order agree.
    pub fn append(
        &self,
        arguments: A,
        exit: Arc<Exit<R, F>>,
    ) -> Result<Arc<CallRecord<A, R, F>>, LedgerPoisoned> {
        let mut records = self.records.lock().map_err(|_| LedgerPoisoned)?;
        let record = Arc::new(CallRecord {
            sequence: records.len() as u64,
            called_at: Utc::now(),
            arguments,
            exit,
        });
        records.push(Arc::clone(&record));
        Ok(record)
    }

    /// Copies the ledger as it is now. Later appends are not visible through it.
    pub fn snapshot(&self) -> Result<HistorySnapshot<A, R, F>, LedgerPoisoned> {
        let records = self.records.lock().map_err(|_| LedgerPoisoned)?;
        Ok(HistorySnapshot {
            records: Arc::from(records.as_slice()),
        })
    }

    pub fn len(&self) -> Result<usize, LedgerPoisoned> {
        Ok(self.records.lock().map_err(|_| LedgerPoisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerPoisoned> {
        Ok(self.len()? == 0)
    }
}

/// Immutable copy of a call ledger.
pub struct HistorySnapshot<A, R, F> {
    records: Arc<[Arc<CallRecord<A, R, F>>]>,
}

impl<A, R, F> Clone for HistorySnapshot<A, R, F> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<A, R, F> HistorySnapshot<A, R, F> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CallRecord<A, R, F>> {
        self.records.get(index).map(|r| r.as_ref())
    }

    pub fn first(&self) -> Option<&CallRecord<A, R, F>> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&CallRecord<A, R, F>> {
        self.records.last().map(|r| r.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallRecord<A, R, F>> + '_ {
        self.records.iter().map(|r| r.as_ref())
    }

    /// Arguments of each call, oldest first.
    pub fn arguments(&self) -> impl Iterator<Item = &A> + '_ {
        self.iter().map(|r| &r.arguments)
    }
}

impl<A, R, F: CheckedFaults> HistorySnapshot<A, R, F> {
    pub fn summaries(&self) -> Vec<CallSummary> {
        self.iter().map(CallRecord::summary).collect()
    }
}

impl<A, R, F> Index<usize> for HistorySnapshot<A, R, F> {
    type Output = CallRecord<A, R, F>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a, A, R, F> IntoIterator for &'a HistorySnapshot<A, R, F> {
    type Item = &'a CallRecord<A, R, F>;
    type IntoIter = Box<dyn Iterator<Item = &'a CallRecord<A, R, F>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<A: std::fmt::Debug, R: std::fmt::Debug, F: std::fmt::Debug> std::fmt::Debug
    for HistorySnapshot<A, R, F>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
