use crate::connection::{Connection, DatabaseConfig};
use crate::core::{Result, TxnId};
use crate::storage::{CompactionStats, Compactor, Vacuum, VersionStore};
use crate::transaction::{IsolationLevel, TransactionRegistry, TransactionState};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{Level, event, info_span};

/// Everything the lock protects: the registry, the version chains and the
/// isolation level handed to new connections.
pub(crate) struct DatabaseState {
    pub(crate) isolation_level: IsolationLevel,
    pub(crate) registry: TransactionRegistry,
    pub(crate) store: VersionStore,
}

/// In-memory MVCC key-value database.
///
/// Owns the transaction registry and the version store; connections borrow
/// the database for their whole lifetime. `Database` is `Send + Sync`, so
/// connections may be opened from several threads at once.
///
/// # Examples
///
/// ```
/// use rustmemokv::Database;
///
/// # fn main() -> rustmemokv::Result<()> {
/// let db = Database::new();
///
/// let mut writer = db.create_connection()?;
/// writer.set("greeting", "hello")?;
/// writer.commit()?;
///
/// let reader = db.create_connection()?;
/// assert_eq!(reader.get("greeting")?, Some("hello".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct Database {
    config: DatabaseConfig,
    state: RwLock<DatabaseState>,
    // Advanced only while the state write lock is held, so id order matches
    // registration order.
    next_txn_id: AtomicU64,
}

impl Database {
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        let state = DatabaseState {
            isolation_level: config.isolation_level,
            registry: TransactionRegistry::new(),
            store: VersionStore::new(),
        };

        Self {
            config,
            state: RwLock::new(state),
            next_txn_id: AtomicU64::new(TxnId::FIRST.as_u64()),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.database
    }

    /// Change the isolation level for connections created from now on.
    /// Open connections keep the level they started with.
    pub fn set_isolation_level(&self, level: IsolationLevel) -> Result<()> {
        self.write_state()?.isolation_level = level;
        event!(Level::DEBUG, database = %self.config.database, isolation = %level, "isolation level changed");
        Ok(())
    }

    pub fn isolation_level(&self) -> Result<IsolationLevel> {
        Ok(self.read_state()?.isolation_level)
    }

    /// Start a transaction at the database's current isolation level.
    pub fn create_connection(&self) -> Result<Connection<'_>> {
        let mut state = self.write_state()?;
        let level = state.isolation_level;
        let id = self.begin(&mut state, level);
        Ok(Connection::new(self, id, level))
    }

    /// Start a transaction at `level` without touching the database setting.
    pub fn create_connection_with(&self, level: IsolationLevel) -> Result<Connection<'_>> {
        let mut state = self.write_state()?;
        let id = self.begin(&mut state, level);
        Ok(Connection::new(self, id, level))
    }

    fn begin(&self, state: &mut DatabaseState, level: IsolationLevel) -> TxnId {
        let id = TxnId(self.next_txn_id.fetch_add(1, Ordering::SeqCst));
        let txn = state.registry.begin(id, level);

        event!(
            Level::DEBUG,
            database = %self.config.database,
            txn = %id,
            isolation = %level,
            concurrent = txn.in_progress_at_start().len(),
            "transaction started"
        );

        id
    }

    /// State of a transaction, or `None` if it never existed or was
    /// reclaimed by compaction.
    pub fn transaction_state(&self, id: TxnId) -> Result<Option<TransactionState>> {
        Ok(self.read_state()?.registry.state_of(id).ok())
    }

    pub fn stats(&self) -> Result<DatabaseStats> {
        let state = self.read_state()?;
        let registry = &state.registry;

        Ok(DatabaseStats {
            transactions: registry.len(),
            in_progress: registry.count_in_state(TransactionState::InProgress),
            committed: registry.count_in_state(TransactionState::Committed),
            aborted: registry.count_in_state(TransactionState::Aborted),
            keys: state.store.key_count(),
            versions: state.store.version_count(),
        })
    }

    /// Run a compaction collaborator with exclusive access to the registry
    /// and the store.
    pub fn compact_with(&self, compactor: &mut dyn Compactor) -> Result<CompactionStats> {
        let span = info_span!("database.compact", database = %self.config.database);
        let _enter = span.enter();

        let mut guard = self.write_state()?;
        let DatabaseState {
            registry, store, ..
        } = &mut *guard;
        let stats = compactor.compact(registry, store)?;

        event!(
            Level::INFO,
            versions_reclaimed = stats.versions_reclaimed,
            transactions_reclaimed = stats.transactions_reclaimed,
            "compaction finished"
        );
        Ok(stats)
    }

    /// Reclaim versions and transaction records no transaction can observe.
    pub fn vacuum(&self) -> Result<CompactionStats> {
        self.compact_with(&mut Vacuum)
    }

    pub(crate) fn read_state(&self) -> Result<RwLockReadGuard<'_, DatabaseState>> {
        Ok(self.state.read()?)
    }

    pub(crate) fn write_state(&self) -> Result<RwLockWriteGuard<'_, DatabaseState>> {
        Ok(self.state.write()?)
    }

    /// Write access even after a panic poisoned the lock. Only for marking a
    /// transaction aborted, which touches nothing but its own record.
    pub(crate) fn write_state_for_abort(&self) -> RwLockWriteGuard<'_, DatabaseState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.config.database)
            .field("next_txn_id", &self.next_txn_id.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub transactions: usize,
    pub in_progress: usize,
    pub committed: usize,
    pub aborted: usize,
    pub keys: usize,
    pub versions: usize,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} transactions ({} in progress, {} committed, {} aborted), {} keys, {} versions",
            self.transactions, self.in_progress, self.committed, self.aborted, self.keys, self.versions
        )
    }
}
