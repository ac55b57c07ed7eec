//! Table bootstrap for tier databases.
//!
//! Production databases are provisioned externally; this only creates the
//! whitelisted tables that are missing, leaving existing ones untouched.

use crate::tier::Table;
use rusqlite::{Connection, Result as SqliteResult};

/// Create any missing whitelisted tables.
pub fn initialize_schema(conn: &Connection) -> SqliteResult<()> {
    // In-memory databases ignore this and stay in "memory" mode
    conn.pragma_update(None, "journal_mode", "WAL")?;

    for table in Table::ALL {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    data BLOB NOT NULL
                )",
                table.as_str()
            ),
            [],
        )?;
    }

    Ok(())
}

/// Check whether a whitelisted table exists.
pub fn table_exists(conn: &Connection, table: Table) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table.as_str()],
        |row| row.get::<_, i32>(0),
    )
    .map(|count| count > 0)
    .unwrap_or(false)
}

/// Check if every whitelisted table exists.
pub fn is_initialized(conn: &Connection) -> bool {
    Table::ALL.iter().all(|t| table_exists(conn, *t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_schema() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!is_initialized(&conn));

        initialize_schema(&conn).unwrap();
        assert!(is_initialized(&conn));
    }

    #[test]
    fn test_idempotent_initialization() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute("INSERT INTO memory (data) VALUES (x'01')", [])
            .unwrap();

        initialize_schema(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM memory", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_partial_schema_is_completed() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE metrics (id INTEGER PRIMARY KEY AUTOINCREMENT, data BLOB)",
            [],
        )
        .unwrap();
        assert!(table_exists(&conn, Table::Metrics));
        assert!(!is_initialized(&conn));

        initialize_schema(&conn).unwrap();
        assert!(is_initialized(&conn));
    }

    #[test]
    fn test_wal_mode_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("l2.db")).unwrap();
        initialize_schema(&conn).unwrap();

        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
