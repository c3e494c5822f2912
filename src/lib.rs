// ============================================================================
// RustMemKV Library
// ============================================================================
//
// In-memory key-value store with multi-version concurrency control.
//
// Every write appends a version to the key's chain; readers pick the newest
// version their transaction may see. Four isolation levels are supported:
// Read Committed, Repeatable Read, Snapshot Isolation and Serializable.
//
// ============================================================================

//! # Examples
//!
//! ```
//! use rustmemokv::{Database, DbError, IsolationLevel};
//!
//! # fn main() -> rustmemokv::Result<()> {
//! let db = Database::new();
//! db.set_isolation_level(IsolationLevel::SnapshotIsolation)?;
//!
//! let mut alice = db.create_connection()?;
//! let mut bob = db.create_connection()?;
//! alice.set("balance", "100")?;
//! bob.set("balance", "200")?;
//!
//! alice.commit()?;
//! // First committer wins.
//! assert!(matches!(bob.commit(), Err(DbError::WriteConflict { .. })));
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod core;
pub mod facade;
pub mod storage;
pub mod transaction;

pub use connection::{Connection, DatabaseConfig};
pub use crate::core::{DbError, Key, Result, TxnId, Value};
pub use facade::{Database, DatabaseStats};
pub use storage::{CompactionStats, Compactor, Vacuum, Version, VersionChain, VersionStore};
pub use transaction::{IsolationLevel, Transaction, TransactionRegistry, TransactionState};
