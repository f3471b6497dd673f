use rusqlite::{Connection, params};
use std::fs;
use std::path::Path;
use storescrub::core::terms::MatchTermSet;
use storescrub::plugins::Applied;
use storescrub::plugins::tabular::{ITEM_TABLE, connect, matching_keys, purge, verify};
use tempfile::tempdir;

fn seed_store(path: &Path, keys: &[&str]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB);",
    )
    .unwrap();
    for key in keys {
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
            params![key, format!("value-of-{}", key)],
        )
        .unwrap();
    }
}

fn remaining_keys(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT key FROM {} ORDER BY rowid", ITEM_TABLE))
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

fn augment_terms() -> MatchTermSet {
    MatchTermSet::from_terms(["augment"])
}

#[test]
fn test_purge_removes_only_matching_rows() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    seed_store(&db, &["augmentFoo", "augmentBar", "other"]);

    let applied = purge(&db, &augment_terms()).unwrap();
    match applied {
        Applied::Changed { affected, changes } => {
            assert_eq!(affected, 2);
            assert!(changes.is_empty());
        }
        other => panic!("expected rows to be removed, got {:?}", other),
    }
    assert_eq!(remaining_keys(&db), vec!["other".to_string()]);
    verify(&db).unwrap();
}

#[test]
fn test_purge_matches_case_insensitively() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    seed_store(&db, &["AUGMENT.chat", "extension.Augment.state", "workbench.panel"]);

    let applied = purge(&db, &augment_terms()).unwrap();
    assert_eq!(applied, Applied::removed(2));
    assert_eq!(remaining_keys(&db), vec!["workbench.panel".to_string()]);
}

#[test]
fn test_second_purge_is_a_no_op() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    seed_store(&db, &["augmentFoo", "other"]);

    assert!(purge(&db, &augment_terms()).unwrap().is_changed());
    assert_eq!(purge(&db, &augment_terms()).unwrap(), Applied::Unchanged);
    assert_eq!(remaining_keys(&db), vec!["other".to_string()]);
}

#[test]
fn test_no_match_leaves_file_bytes_identical() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    seed_store(&db, &["workbench.panel", "terminal.history"]);
    let before = fs::read(&db).unwrap();

    assert_eq!(purge(&db, &augment_terms()).unwrap(), Applied::Unchanged);
    assert_eq!(fs::read(&db).unwrap(), before);
}

#[test]
fn test_empty_term_set_matches_nothing() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    seed_store(&db, &["augmentFoo"]);

    let empty = MatchTermSet::from_terms(Vec::<String>::new());
    assert_eq!(purge(&db, &empty).unwrap(), Applied::Unchanged);
    assert_eq!(remaining_keys(&db).len(), 1);
}

#[test]
fn test_matching_keys_preserves_table_order() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    seed_store(&db, &["z.augment", "a.other", "m.augment"]);

    let conn = connect(&db).unwrap();
    let keys = matching_keys(&conn, &db, &augment_terms()).unwrap();
    assert_eq!(keys, vec!["z.augment".to_string(), "m.augment".to_string()]);
}

#[test]
fn test_malformed_file_is_a_parse_failure() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    fs::write(&db, b"this is definitely not an sqlite database, just text padding it out").unwrap();

    let err = purge(&db, &augment_terms()).unwrap_err();
    assert!(err.is_parse_failure(), "unexpected error: {}", err);
}

#[test]
fn test_missing_item_table_is_a_parse_failure() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("state.vscdb");
    Connection::open(&db)
        .unwrap()
        .execute_batch("CREATE TABLE Other (k TEXT);")
        .unwrap();

    let err = purge(&db, &augment_terms()).unwrap_err();
    assert!(err.is_parse_failure());
    assert!(verify(&db).unwrap_err().is_parse_failure());
}
