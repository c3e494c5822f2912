use serde::{Deserialize, Serialize};

pub type Key = String;
pub type Value = String;

/// Identifier of a transaction, allocated from a per-database counter.
///
/// Ids are strictly increasing and never reused; `0` is reserved as the
/// "no transaction" sentinel, so the first allocated id is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(pub u64);

impl TxnId {
    pub const INVALID: TxnId = TxnId(0);
    pub const FIRST: TxnId = TxnId(1);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}
