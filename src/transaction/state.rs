// ============================================================================
// Transaction State Management
// ============================================================================
//
// A transaction moves InProgress -> Committed | Aborted exactly once. The
// record outlives its connection: versions keep pointing at creator/closer
// ids, so visibility checks look the record up long after the session ended.
//
// ============================================================================

use super::IsolationLevel;
use crate::core::{DbError, Key, Result, TxnId};
use im::OrdSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Transaction state
///
/// State transitions:
/// ```text
/// InProgress ──commit──> Committed
///   │
///   └──abort──> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionState {
    InProgress,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, TransactionState::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted
        )
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::InProgress => write!(f, "IN PROGRESS"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::Aborted => write!(f, "ABORTED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    id: TxnId,
    isolation_level: IsolationLevel,
    state: TransactionState,

    /// Every transaction that was InProgress when this one was created.
    /// Fixed at creation.
    in_progress_at_start: OrdSet<TxnId>,

    read_set: HashSet<Key>,
    write_set: HashSet<Key>,
}

impl Transaction {
    pub fn new(id: TxnId, isolation_level: IsolationLevel, in_progress_at_start: OrdSet<TxnId>) -> Self {
        Self {
            id,
            isolation_level,
            state: TransactionState::InProgress,
            in_progress_at_start,
            read_set: HashSet::new(),
            write_set: HashSet::new(),
        }
    }

    pub fn id(&self) -> TxnId {
        self.id
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn in_progress_at_start(&self) -> &OrdSet<TxnId> {
        &self.in_progress_at_start
    }

    /// Whether `other` was still undecided when this transaction began.
    pub fn was_concurrent_with(&self, other: TxnId) -> bool {
        self.in_progress_at_start.contains(&other)
    }

    pub fn read_set(&self) -> &HashSet<Key> {
        &self.read_set
    }

    pub fn write_set(&self) -> &HashSet<Key> {
        &self.write_set
    }

    pub(crate) fn record_read(&mut self, key: &str) {
        if !self.read_set.contains(key) {
            self.read_set.insert(key.to_string());
        }
    }

    pub(crate) fn record_write(&mut self, key: &str) {
        if !self.write_set.contains(key) {
            self.write_set.insert(key.to_string());
        }
    }

    /// Mark transaction as committed
    ///
    /// # Errors
    /// Returns error if transaction is not in progress
    pub fn commit(&mut self) -> Result<()> {
        if !self.state.is_in_progress() {
            return Err(DbError::TransactionNotActive {
                txn: self.id,
                state: self.state,
            });
        }

        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Mark transaction as aborted. Returns `false` if it was already terminal,
    /// in which case the state is left untouched.
    pub fn abort(&mut self) -> bool {
        if !self.state.is_in_progress() {
            return false;
        }

        self.state = TransactionState::Aborted;
        true
    }
}
