/// Vacuum tests
///
/// Compaction of superseded versions and finished transaction records
/// Run with: cargo test --test vacuum_tests

use rustmemokv::{
    CompactionStats, Compactor, Database, IsolationLevel, Result, TransactionRegistry,
    TransactionState, VersionStore,
};

fn write(db: &Database, key: &str, value: &str) {
    let mut conn = db.create_connection().unwrap();
    conn.set(key, value).unwrap();
    conn.commit().unwrap();
}

#[test]
fn test_vacuum_reclaims_superseded_versions() {
    let db = Database::new();
    for i in 1..=6 {
        write(&db, "key", &format!("v{}", i));
    }
    assert_eq!(db.stats().unwrap().versions, 6);

    let stats = db.vacuum().unwrap();
    assert_eq!(stats.versions_reclaimed, 5);
    assert_eq!(stats.transactions_reclaimed, 5);

    let after = db.stats().unwrap();
    assert_eq!(after.versions, 1);
    assert_eq!(after.transactions, 1);

    let reader = db.create_connection().unwrap();
    assert_eq!(reader.get("key").unwrap(), Some("v6".to_string()));
}

#[test]
fn test_vacuum_respects_active_snapshot() {
    let db = Database::new();
    write(&db, "key", "old");

    let reader = db
        .create_connection_with(IsolationLevel::RepeatableRead)
        .unwrap();
    assert_eq!(reader.get("key").unwrap(), Some("old".to_string()));

    write(&db, "key", "new");

    let stats = db.vacuum().unwrap();
    assert_eq!(stats.versions_reclaimed, 0);
    assert_eq!(reader.get("key").unwrap(), Some("old".to_string()));

    reader.commit().unwrap();

    let stats = db.vacuum().unwrap();
    assert_eq!(stats.versions_reclaimed, 1);
    assert_eq!(db.stats().unwrap().versions, 1);

    let later = db.create_connection().unwrap();
    assert_eq!(later.get("key").unwrap(), Some("new".to_string()));
}

#[test]
fn test_vacuum_keeps_versions_of_undecided_writers() {
    let db = Database::new();
    write(&db, "key", "committed");

    let mut pending = db.create_connection().unwrap();
    pending.set("key", "pending").unwrap();

    let stats = db.vacuum().unwrap();
    assert_eq!(stats.versions_reclaimed, 0);

    pending.commit().unwrap();
    let reader = db.create_connection().unwrap();
    assert_eq!(reader.get("key").unwrap(), Some("pending".to_string()));
}

#[test]
fn test_vacuum_reclaims_aborted_writes() {
    let db = Database::new();
    write(&db, "key", "kept");

    let mut doomed = db.create_connection().unwrap();
    let doomed_id = doomed.id();
    doomed.set("key", "discarded").unwrap();
    doomed.abort().unwrap();

    let stats = db.vacuum().unwrap();
    assert_eq!(stats.versions_reclaimed, 1);
    assert_eq!(stats.transactions_reclaimed, 1);
    assert_eq!(db.transaction_state(doomed_id).unwrap(), None);

    let reader = db.create_connection().unwrap();
    assert_eq!(reader.get("key").unwrap(), Some("kept".to_string()));
}

#[test]
fn test_delete_after_vacuum_empties_chain() {
    let db = Database::new();
    write(&db, "key", "value");

    let mut deleter = db.create_connection().unwrap();
    assert!(deleter.delete("key").unwrap());
    deleter.commit().unwrap();

    db.vacuum().unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.versions, 0);
    assert_eq!(stats.keys, 1);

    // The key was written once, so delete still reports it.
    let mut conn = db.create_connection().unwrap();
    assert_eq!(conn.get("key").unwrap(), None);
    assert!(conn.delete("key").unwrap());
    conn.set("key", "again").unwrap();
    conn.commit().unwrap();

    let reader = db.create_connection().unwrap();
    assert_eq!(reader.get("key").unwrap(), Some("again".to_string()));
}

#[test]
fn test_nothing_pruned_without_compaction() {
    let db = Database::new();
    for i in 0..10 {
        write(&db, "key", &i.to_string());
    }
    let aborted = db.create_connection().unwrap();
    aborted.abort().unwrap();

    let stats = db.stats().unwrap();
    assert_eq!(stats.versions, 10);
    assert_eq!(stats.transactions, 11);
    assert_eq!(stats.aborted, 1);
}

/// Records what it was handed and prunes nothing.
#[derive(Default)]
struct Inspector {
    calls: usize,
    seen_transactions: usize,
    seen_versions: usize,
}

impl Compactor for Inspector {
    fn compact(
        &mut self,
        registry: &mut TransactionRegistry,
        store: &mut VersionStore,
    ) -> Result<CompactionStats> {
        self.calls += 1;
        self.seen_transactions = registry.len();
        self.seen_versions = store.version_count();
        Ok(CompactionStats::default())
    }
}

#[test]
fn test_custom_compactor_hook() {
    let db = Database::new();
    write(&db, "a", "1");
    write(&db, "a", "2");
    let open = db.create_connection().unwrap();

    let mut inspector = Inspector::default();
    let stats = db.compact_with(&mut inspector).unwrap();

    assert_eq!(stats, CompactionStats::default());
    assert_eq!(inspector.calls, 1);
    assert_eq!(inspector.seen_transactions, 3);
    assert_eq!(inspector.seen_versions, 2);
    assert_eq!(open.state().unwrap(), TransactionState::InProgress);
}

#[test]
fn test_vacuum_keeps_committed_delete_after_aborted_overwrite() {
    for level in IsolationLevel::ALL {
        let db = Database::new();
        db.set_isolation_level(level).unwrap();
        write(&db, "key", "v0");

        let mut older = db.create_connection().unwrap();
        let mut deleter = db.create_connection().unwrap();
        assert!(deleter.delete("key").unwrap());
        older.set("key", "tmp").unwrap();
        if level == IsolationLevel::Serializable {
            // Both wrote the key while contemporaries; only one may commit.
            assert!(deleter.commit().is_err());
            older.abort().unwrap();
            continue;
        }
        deleter.commit().unwrap();
        older.abort().unwrap();

        db.vacuum().unwrap();

        let reader = db.create_connection().unwrap();
        assert_eq!(reader.get("key").unwrap(), None, "{}", level);
        assert_eq!(db.stats().unwrap().versions, 0, "{}", level);
    }
}
