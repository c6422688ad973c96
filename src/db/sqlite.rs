//! SQLite connection setup and the versioned medbook schema.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use super::StoreError;

/// Schema steps in order. Each script records its own version row.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../resources/migrations/001_medicines.sql")),
    (2, include_str!("../../resources/migrations/002_api_tokens.sql")),
];

pub fn open_database(path: &Path) -> Result<Connection, StoreError> {
    prepare(Connection::open(path)?)
}

/// Private in-memory store, migrated like a file.
pub fn open_memory_database() -> Result<Connection, StoreError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection, StoreError> {
    // medicine_keywords cascades on medicine delete
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )?;
    run_migrations(&conn)?;
    Ok(conn)
}

pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    apply_migrations(conn, MIGRATIONS)
}

fn apply_migrations(conn: &Connection, migrations: &[(i64, &str)]) -> Result<(), StoreError> {
    let current = schema_version(conn)?;
    for &(version, sql) in migrations.iter().filter(|(v, _)| *v > current) {
        tracing::info!(version, "Applying schema migration");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql).map_err(|e| StoreError::MigrationFailed {
            version,
            reason: e.to_string(),
        })?;
        tx.commit()?;
    }
    Ok(())
}

/// Highest applied version, 0 on a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i64, StoreError> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(0);
    }
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })?;
    Ok(version)
}

#[cfg(test)]
fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .unwrap();
    let names = stmt.query_map([], |row| row.get(0)).unwrap();
    names.collect::<Result<_, _>>().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLES: [&str; 4] = ["api_tokens", "medicine_keywords", "medicines", "schema_version"];

    #[test]
    fn fresh_database_has_medbook_schema() {
        let conn = open_memory_database().unwrap();
        assert_eq!(table_names(&conn), TABLES);
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn rerunning_migrations_is_a_no_op() {
        let conn = open_memory_database().unwrap();
        run_migrations(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn failed_migration_rolls_back_and_names_its_version() {
        let conn = open_memory_database().unwrap();
        let broken: &[(i64, &str)] = &[(
            3,
            "CREATE TABLE refills (id TEXT); INSERT INTO no_such_table VALUES (1);",
        )];

        let err = apply_migrations(&conn, broken).unwrap_err();
        assert!(matches!(err, StoreError::MigrationFailed { version: 3, .. }));
        assert_eq!(table_names(&conn), TABLES);
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn keywords_follow_deleted_medicine() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO medicines (id, user_id, created_at, document)
                 VALUES ('m1', 'alice', '2026-10-16T09:00:00.000Z', '{}');
             INSERT INTO medicine_keywords (medicine_id, keyword) VALUES ('m1', 'zinc');
             DELETE FROM medicines WHERE id = 'm1';",
        )
        .unwrap();
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM medicine_keywords", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn documents_must_be_json() {
        let conn = open_memory_database().unwrap();
        let result = conn.execute(
            "INSERT INTO medicines (id, user_id, created_at, document)
             VALUES ('m1', 'alice', '2026-10-16T09:00:00.000Z', 'not json')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn reopening_file_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medbook.db");
        drop(open_database(&path).unwrap());

        let conn = open_database(&path).unwrap();
        assert_eq!(table_names(&conn), TABLES);
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }
}
