// ============================================================================
// Conflict Detection & Commit Validation
// ============================================================================
//
// Only transactions that were InProgress when the committing transaction
// began are checked. Transactions that began later are never consulted.
//
// ============================================================================

use super::{IsolationLevel, Transaction, TransactionRegistry, TransactionState};
use crate::core::{DbError, Result};

/// Both transactions wrote (or deleted) at least one common key.
pub fn has_write_conflict(a: &Transaction, b: &Transaction) -> bool {
    !a.write_set().is_disjoint(b.write_set())
}

/// One transaction read a key the other wrote, in either direction.
pub fn has_read_write_conflict(a: &Transaction, b: &Transaction) -> bool {
    !a.write_set().is_disjoint(b.read_set()) || !a.read_set().is_disjoint(b.write_set())
}

/// Validate `txn` against its contemporaries, in id order.
///
/// Returns the first conflict found; the caller is responsible for aborting.
pub fn validate_commit(txn: &Transaction, registry: &TransactionRegistry) -> Result<()> {
    let level = txn.isolation_level();
    if !level.validates_on_commit() {
        return Ok(());
    }

    for &other_id in txn.in_progress_at_start() {
        let other = registry.get(other_id)?;

        match level {
            IsolationLevel::ReadCommitted | IsolationLevel::RepeatableRead => {}
            IsolationLevel::SnapshotIsolation => {
                if other.state() != TransactionState::Committed {
                    continue;
                }
                if has_write_conflict(txn, other) {
                    return Err(DbError::WriteConflict {
                        txn: txn.id(),
                        other: other_id,
                    });
                }
            }
            // Checked regardless of the other transaction's current state.
            IsolationLevel::Serializable => {
                if has_write_conflict(txn, other) {
                    return Err(DbError::WriteConflict {
                        txn: txn.id(),
                        other: other_id,
                    });
                }
                if has_read_write_conflict(txn, other) {
                    return Err(DbError::ReadWriteConflict {
                        txn: txn.id(),
                        other: other_id,
                    });
                }
            }
        }
    }

    Ok(())
}
