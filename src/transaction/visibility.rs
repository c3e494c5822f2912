// ============================================================================
// Visibility
// ============================================================================
//
// Decides whether a reader may observe a version. Read Committed evaluates
// creator and closer against their state right now; the snapshot levels
// evaluate them against what was decided when the reader began.
//
// ============================================================================

use super::{Transaction, TransactionRegistry, VisibilityStrategy};
use crate::core::{Result, TxnId};
use crate::storage::Version;

pub fn is_visible(
    version: &Version,
    reader: &Transaction,
    registry: &TransactionRegistry,
) -> Result<bool> {
    match reader.isolation_level().visibility() {
        VisibilityStrategy::LiveState => is_visible_live(version, reader, registry),
        VisibilityStrategy::Snapshot => is_visible_in_snapshot(version, reader, registry),
    }
}

fn is_visible_live(
    version: &Version,
    reader: &Transaction,
    registry: &TransactionRegistry,
) -> Result<bool> {
    // Deleted or overwritten by the reader itself.
    if version.is_closed_by(reader.id()) {
        return Ok(false);
    }

    if version.created_by() == reader.id() {
        return Ok(true);
    }

    if !registry.is_committed(version.created_by())? {
        return Ok(false);
    }

    for &closer in version.closed_by() {
        if registry.is_committed(closer)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_visible_in_snapshot(
    version: &Version,
    reader: &Transaction,
    registry: &TransactionRegistry,
) -> Result<bool> {
    if !snapshot_includes(version.created_by(), reader, registry)? {
        return Ok(false);
    }

    for &closer in version.closed_by() {
        if snapshot_includes(closer, reader, registry)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether the effects of `writer` belong to `reader`'s snapshot.
fn snapshot_includes(
    writer: TxnId,
    reader: &Transaction,
    registry: &TransactionRegistry,
) -> Result<bool> {
    if writer == reader.id() {
        return Ok(true);
    }

    // Began after the reader.
    if writer > reader.id() {
        return Ok(false);
    }

    // Undecided when the reader began.
    if reader.was_concurrent_with(writer) {
        return Ok(false);
    }

    registry.is_committed(writer)
}
