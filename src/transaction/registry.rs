// ============================================================================
// Transaction Registry
// ============================================================================

use super::{IsolationLevel, Transaction, TransactionState};
use crate::core::{DbError, Result, TxnId};
use im::OrdSet;
use std::collections::BTreeMap;

/// Sole owner of every transaction record, keyed by id.
///
/// Records are kept after they commit or abort; only a compaction
/// collaborator may drop decided ones through [`TransactionRegistry::retain_decided`].
#[derive(Debug, Default)]
pub struct TransactionRegistry {
    transactions: BTreeMap<TxnId, Transaction>,

    // Copy-on-write cache of InProgress ids: cloning it into a new
    // transaction's snapshot is O(1).
    in_progress: OrdSet<TxnId>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new InProgress transaction. Its snapshot is every
    /// transaction InProgress right before the insert.
    pub(crate) fn begin(&mut self, id: TxnId, isolation_level: IsolationLevel) -> &Transaction {
        debug_assert!(id.is_valid());
        debug_assert!(!self.transactions.contains_key(&id));

        let snapshot = self.in_progress.clone();
        self.in_progress.insert(id);
        self.transactions
            .entry(id)
            .or_insert_with(|| Transaction::new(id, isolation_level, snapshot))
    }

    pub fn get(&self, id: TxnId) -> Result<&Transaction> {
        self.transactions
            .get(&id)
            .ok_or(DbError::TransactionNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: TxnId) -> Result<&mut Transaction> {
        self.transactions
            .get_mut(&id)
            .ok_or(DbError::TransactionNotFound(id))
    }

    pub fn state_of(&self, id: TxnId) -> Result<TransactionState> {
        self.get(id).map(Transaction::state)
    }

    pub fn is_committed(&self, id: TxnId) -> Result<bool> {
        Ok(self.state_of(id)? == TransactionState::Committed)
    }

    pub(crate) fn mark_committed(&mut self, id: TxnId) -> Result<()> {
        self.get_mut(id)?.commit()?;
        self.in_progress.remove(&id);
        Ok(())
    }

    /// Returns `false` if the transaction had already reached a terminal state.
    pub(crate) fn mark_aborted(&mut self, id: TxnId) -> Result<bool> {
        let aborted = self.get_mut(id)?.abort();
        self.in_progress.remove(&id);
        Ok(aborted)
    }

    pub fn in_progress(&self) -> &OrdSet<TxnId> {
        &self.in_progress
    }

    pub fn oldest_in_progress(&self) -> Option<TxnId> {
        self.in_progress.get_min().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn count_in_state(&self, state: TransactionState) -> usize {
        if state == TransactionState::InProgress {
            return self.in_progress.len();
        }
        self.transactions
            .values()
            .filter(|txn| txn.state() == state)
            .count()
    }

    /// Drop decided transactions for which `keep` returns `false`.
    /// InProgress records are never offered. Returns the number removed.
    pub fn retain_decided<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Transaction) -> bool,
    {
        let before = self.transactions.len();
        self.transactions
            .retain(|_, txn| txn.state().is_in_progress() || keep(txn));
        before - self.transactions.len()
    }
}
