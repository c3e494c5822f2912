pub mod config;

use crate::core::{Result, TxnId, Value};
use crate::facade::{Database, DatabaseState};
use crate::storage::Version;
use crate::transaction::{IsolationLevel, TransactionState, is_visible, validate_commit};
use tracing::{Level, event};

pub use config::DatabaseConfig;

/// Database connection handle
///
/// Bound to exactly one transaction for its whole life. Reads and writes go
/// through the version store, filtered by the transaction's isolation level.
/// `commit` and `abort` consume the connection; dropping it while the
/// transaction is still in progress aborts it, so writes are lost unless
/// committed explicitly.
pub struct Connection<'db> {
    db: &'db Database,
    txn_id: TxnId,
    isolation_level: IsolationLevel,
    /// Set once commit or abort ran, so drop leaves the record alone.
    finished: bool,
}

impl<'db> Connection<'db> {
    pub(crate) fn new(db: &'db Database, txn_id: TxnId, isolation_level: IsolationLevel) -> Self {
        Self {
            db,
            txn_id,
            isolation_level,
            finished: false,
        }
    }

    /// Get transaction ID
    pub fn id(&self) -> TxnId {
        self.txn_id
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    pub fn state(&self) -> Result<TransactionState> {
        self.db.read_state()?.registry.state_of(self.txn_id)
    }

    /// Value of `key` visible to this transaction, or `None` if the key was
    /// never written or no version of it is visible.
    ///
    /// The key joins the read set either way.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut guard = self.db.write_state()?;
        let DatabaseState {
            registry, store, ..
        } = &mut *guard;

        let value = match store.chain(key) {
            Some(chain) => {
                let reader = registry.get(self.txn_id)?;
                chain
                    .find_visible(|version| is_visible(version, reader, registry))?
                    .map(|version| version.value().clone())
            }
            None => None,
        };

        registry.get_mut(self.txn_id)?.record_read(key);
        Ok(value)
    }

    /// Supersede every version of `key` visible to this transaction with `value`.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut guard = self.db.write_state()?;
        let DatabaseState {
            registry, store, ..
        } = &mut *guard;

        let writer = registry.get(self.txn_id)?;
        let chain = store.chain_or_insert(key);
        chain.close_visible(self.txn_id, |version| is_visible(version, writer, registry))?;
        chain.push(Version::new(value.into(), self.txn_id));

        registry.get_mut(self.txn_id)?.record_write(key);
        Ok(())
    }

    /// Close every version of `key` visible to this transaction.
    ///
    /// Returns `false`, without recording anything, only if the key was never
    /// written. A key that exists but is already invisible here still
    /// reports `true`.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let mut guard = self.db.write_state()?;
        let DatabaseState {
            registry, store, ..
        } = &mut *guard;

        let Some(chain) = store.chain_mut(key) else {
            return Ok(false);
        };

        let deleter = registry.get(self.txn_id)?;
        chain.close_visible(self.txn_id, |version| is_visible(version, deleter, registry))?;

        registry.get_mut(self.txn_id)?.record_write(key);
        Ok(true)
    }

    /// Validate against contemporaries and commit.
    ///
    /// # Errors
    /// `DbError::WriteConflict` or `DbError::ReadWriteConflict` when
    /// validation fails; the transaction is aborted before returning.
    pub fn commit(mut self) -> Result<()> {
        let mut guard = self.db.write_state()?;
        self.finished = true;
        let registry = &mut guard.registry;

        let validation = validate_commit(registry.get(self.txn_id)?, registry);
        match validation {
            Ok(()) => {
                registry.mark_committed(self.txn_id)?;
                event!(Level::DEBUG, txn = %self.txn_id, "transaction committed");
                Ok(())
            }
            Err(err) => {
                registry.mark_aborted(self.txn_id)?;
                event!(Level::DEBUG, txn = %self.txn_id, error = %err, "commit rejected, transaction aborted");
                Err(err)
            }
        }
    }

    /// Abort the transaction. Its versions stay in the store but are never
    /// visible to anyone else.
    pub fn abort(mut self) -> Result<()> {
        self.db.write_state()?.registry.mark_aborted(self.txn_id)?;
        self.finished = true;
        event!(Level::DEBUG, txn = %self.txn_id, "transaction aborted");
        Ok(())
    }
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let aborted = self
            .db
            .write_state_for_abort()
            .registry
            .mark_aborted(self.txn_id);
        match aborted {
            Ok(true) => {
                event!(Level::DEBUG, txn = %self.txn_id, "connection dropped, transaction aborted");
            }
            Ok(false) => {}
            Err(err) => {
                event!(Level::WARN, txn = %self.txn_id, error = %err, "implicit abort failed on drop");
            }
        }
    }
}

impl std::fmt::Debug for Connection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("txn_id", &self.txn_id)
            .field("isolation_level", &self.isolation_level)
            .finish_non_exhaustive()
    }
}
