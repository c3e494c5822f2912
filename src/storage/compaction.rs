// ============================================================================
// Compaction
// ============================================================================
//
// The database retains every version and every transaction record. Pruning
// only happens when a caller hands a `Compactor` to `Database::compact_with`
// (or calls `Database::vacuum`, which uses `Vacuum`).
//
// ============================================================================

use super::{Version, VersionStore};
use crate::core::{Result, TxnId};
use crate::transaction::{TransactionRegistry, TransactionState};
use im::OrdSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionStats {
    pub versions_reclaimed: usize,
    pub transactions_reclaimed: usize,
}

/// External collaborator that prunes state no reader can observe anymore.
///
/// Runs with exclusive access to the registry and the store. Implementations
/// must not remove anything an InProgress transaction (or any later one)
/// could still see or validate against.
pub trait Compactor {
    fn compact(
        &mut self,
        registry: &mut TransactionRegistry,
        store: &mut VersionStore,
    ) -> Result<CompactionStats>;
}

/// Reclaims dead versions and the decided transactions nothing refers to.
///
/// A version is dead when its creator aborted, or when one of its closers
/// committed and every InProgress transaction began after that closer was
/// decided. Closers that aborted are forgotten, since no reader treats them
/// as closing.
/// A transaction record is dropped once it is decided, older than the oldest
/// InProgress transaction, absent from every InProgress snapshot and no longer
/// named by any version.
#[derive(Debug, Default, Clone, Copy)]
pub struct Vacuum;

/// InProgress transactions at the start of a pass, with their snapshots.
struct Horizon {
    readers: Vec<(TxnId, OrdSet<TxnId>)>,
}

impl Horizon {
    fn capture(registry: &TransactionRegistry) -> Result<Self> {
        let mut readers = Vec::with_capacity(registry.in_progress().len());
        for &id in registry.in_progress() {
            let txn = registry.get(id)?;
            readers.push((id, txn.in_progress_at_start().clone()));
        }
        Ok(Self { readers })
    }

    /// `writer` was decided before every current reader began.
    fn precedes_all_readers(&self, writer: TxnId) -> bool {
        self.readers
            .iter()
            .all(|(id, snapshot)| writer < *id && !snapshot.contains(&writer))
    }
}

fn is_dead(version: &Version, registry: &TransactionRegistry, horizon: &Horizon) -> bool {
    if let Ok(TransactionState::Aborted) = registry.state_of(version.created_by()) {
        return true;
    }

    version.closed_by().iter().any(|&closer| {
        matches!(registry.state_of(closer), Ok(TransactionState::Committed))
            && horizon.precedes_all_readers(closer)
    })
}

impl Compactor for Vacuum {
    fn compact(
        &mut self,
        registry: &mut TransactionRegistry,
        store: &mut VersionStore,
    ) -> Result<CompactionStats> {
        let horizon = Horizon::capture(registry)?;

        let mut versions_reclaimed = 0;
        for (_, chain) in store.iter_mut() {
            versions_reclaimed += chain.retain(|version| !is_dead(version, registry, &horizon));
            chain.remove_closers(|closer| {
                matches!(registry.state_of(closer), Ok(TransactionState::Aborted))
            });
        }

        let mut referenced: HashSet<TxnId> = HashSet::new();
        for (_, chain) in store.iter() {
            for version in chain.versions() {
                referenced.insert(version.created_by());
                referenced.extend(version.closed_by().iter().copied());
            }
        }
        for (_, snapshot) in &horizon.readers {
            referenced.extend(snapshot.iter().copied());
        }

        let oldest_in_progress = registry.oldest_in_progress();
        let transactions_reclaimed = registry.retain_decided(|txn| {
            referenced.contains(&txn.id())
                || oldest_in_progress.is_some_and(|oldest| txn.id() > oldest)
        });

        event!(
            Level::DEBUG,
            versions_reclaimed,
            transactions_reclaimed,
            "vacuum pass finished"
        );

        Ok(CompactionStats {
            versions_reclaimed,
            transactions_reclaimed,
        })
    }
}
