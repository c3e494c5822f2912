// ============================================================================
// Isolation Levels
// ============================================================================
//
// The set of levels is closed. Each level picks one visibility strategy and
// one commit validation rule; both are resolved by exhaustive `match`.
//
// ============================================================================

use crate::core::DbError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Reads see whatever is committed at the moment of the read.
    ReadCommitted,

    /// Reads come from the start-of-transaction snapshot; commit never
    /// validates, so lost updates are possible.
    RepeatableRead,

    /// Snapshot reads plus first-committer-wins on write-write conflicts.
    #[default]
    SnapshotIsolation,

    /// Snapshot reads; commit fails on any write-write or read-write overlap
    /// with a contemporary transaction.
    Serializable,
}

/// How versions are filtered for a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityStrategy {
    /// Evaluate creator/closer state as it is right now.
    LiveState,
    /// Evaluate against the in-progress set captured when the reader began.
    Snapshot,
}

impl IsolationLevel {
    pub const ALL: [IsolationLevel; 4] = [
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::SnapshotIsolation,
        IsolationLevel::Serializable,
    ];

    pub fn visibility(&self) -> VisibilityStrategy {
        match self {
            IsolationLevel::ReadCommitted => VisibilityStrategy::LiveState,
            IsolationLevel::RepeatableRead
            | IsolationLevel::SnapshotIsolation
            | IsolationLevel::Serializable => VisibilityStrategy::Snapshot,
        }
    }

    /// Whether commit runs any conflict validation at all.
    pub fn validates_on_commit(&self) -> bool {
        match self {
            IsolationLevel::ReadCommitted | IsolationLevel::RepeatableRead => false,
            IsolationLevel::SnapshotIsolation | IsolationLevel::Serializable => true,
        }
    }
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::RepeatableRead => write!(f, "REPEATABLE READ"),
            IsolationLevel::SnapshotIsolation => write!(f, "SNAPSHOT"),
            IsolationLevel::Serializable => write!(f, "SERIALIZABLE"),
        }
    }
}

impl FromStr for IsolationLevel {
    type Err = DbError;

    /// Accepts SQL spellings ("READ COMMITTED") as well as snake_case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "read committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable read" => Ok(IsolationLevel::RepeatableRead),
            "snapshot" | "snapshot isolation" => Ok(IsolationLevel::SnapshotIsolation),
            "serializable" => Ok(IsolationLevel::Serializable),
            _ => Err(DbError::ParseError(format!(
                "Unknown isolation level '{}'",
                s
            ))),
        }
    }
}
