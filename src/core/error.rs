use super::TxnId;
use crate::transaction::TransactionState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("Write-write conflict: {txn} and {other} wrote the same key")]
    WriteConflict { txn: TxnId, other: TxnId },

    #[error("Read-write conflict: {txn} and {other} touched the same key")]
    ReadWriteConflict { txn: TxnId, other: TxnId },

    #[error("Transaction {txn} is not active (state: {state})")]
    TransactionNotActive { txn: TxnId, state: TransactionState },

    #[error("Transaction {0} not found")]
    TransactionNotFound(TxnId),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl DbError {
    /// Commit was rejected by validation; the caller may retry in a new transaction.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::WriteConflict { .. } | DbError::ReadWriteConflict { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}
