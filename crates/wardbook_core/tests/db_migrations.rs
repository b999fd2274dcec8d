use rusqlite::Connection;
use std::time::Duration;
use wardbook_core::db::migrations::{apply_migrations, latest_version, schema_version};
use wardbook_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "collections");
    assert_table_exists(&conn, "objects");
}

#[test]
fn apply_migrations_reports_steps_and_is_noop_when_current() {
    let mut conn = Connection::open_in_memory().unwrap();

    let first = apply_migrations(&mut conn).unwrap();
    assert_eq!(first.from_version, 0);
    assert_eq!(first.to_version, latest_version());
    assert_eq!(first.applied.len(), latest_version() as usize);
    assert_eq!(first.applied[0], "collections_and_objects");

    let second = apply_migrations(&mut conn).unwrap();
    assert!(second.is_noop());
    assert_eq!(second.from_version, latest_version());
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
}

#[test]
fn apply_migrations_resumes_from_partial_schema() {
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    conn.execute_batch("DROP INDEX idx_objects_collection_created; PRAGMA user_version = 1;")
        .unwrap();

    let report = apply_migrations(&mut conn).unwrap();
    assert_eq!(report.from_version, 1);
    assert_eq!(report.applied, vec!["list_order_index"]);
}

#[test]
fn initial_migration_registers_default_collections() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("SELECT name FROM collections ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(names, vec!["doctor", "nurse", "patient"]);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wardbook.db");

    let conn_first = open_db(&path, Duration::from_secs(1)).unwrap();
    conn_first
        .execute(
            "INSERT INTO objects (collection, object_id, object_data, created_at, updated_at)
             VALUES ('patient', 'p-1', '{}', 1, 1);",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path, Duration::from_secs(1)).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    let rows: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM objects;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path, Duration::from_secs(1)).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_reject_unregistered_collection() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO objects (collection, object_id, object_data, created_at, updated_at)
         VALUES ('pharmacy', 'x', '{}', 1, 1);",
        [],
    );
    assert!(result.is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
