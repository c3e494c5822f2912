// ============================================================================
// Transaction Management Module
// ============================================================================
//
// MVCC transactions over per-key version chains:
// - registry: owns every transaction record, including decided ones
// - visibility: which versions a reader may observe, per isolation level
// - conflict: write-write / read-write detection and commit validation
//
// ============================================================================

pub mod conflict;
pub mod isolation;
pub mod registry;
pub mod state;
pub mod visibility;

pub use conflict::{has_read_write_conflict, has_write_conflict, validate_commit};
pub use isolation::{IsolationLevel, VisibilityStrategy};
pub use registry::TransactionRegistry;
pub use state::{Transaction, TransactionState};
pub use visibility::is_visible;
