//! Engine schema, applied as an ordered list of steps.
//!
//! Only the engine's own tables are versioned; document bodies are
//! schemaless JSON. Each applied step is recorded in `schema_version`.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};

struct Step {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    description: "collections, documents and value indexes",
    sql: r#"
        -- Named collections. The default partition has no row here.
        CREATE TABLE collections (
            name TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,            -- {"id": ..., "attributes": {...}}
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id)
        ) WITHOUT ROWID;

        CREATE TABLE indexes (
            collection TEXT NOT NULL,
            name TEXT NOT NULL,
            sql_name TEXT NOT NULL UNIQUE,
            paths TEXT NOT NULL,           -- JSON array of field paths
            created_at INTEGER NOT NULL,
            PRIMARY KEY (collection, name)
        );
    "#,
}];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Version recorded in `conn`, or 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Bring `conn` up to [`latest_version`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )",
    )?;

    let current = schema_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(StoreError::Migration(format!(
            "schema version {} is newer than {} supported by this build",
            current, latest
        )));
    }

    let pending: Vec<&Step> = STEPS.iter().filter(|step| step.version > current).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.execute(
            "INSERT INTO schema_version (version, description, applied_at) VALUES (?1, ?2, ?3)",
            params![step.version, step.description, crate::now_millis()],
        )?;
    }
    tx.commit()?;

    tracing::debug!(from = current, to = latest, "migrated schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names = stmt.query_map([], |row| row.get(0)).unwrap();
        names.map(|name| name.unwrap()).collect()
    }

    #[test]
    fn test_fresh_database_gets_every_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).ok(), None);

        migrate(&mut conn).unwrap();
        assert_eq!(
            tables(&conn),
            vec!["collections", "documents", "indexes", "schema_version"]
        );
        assert_eq!(schema_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn test_rerun_is_a_no_op() {
        let mut conn = Connection::open_in_memory().unwrap();
        for _ in 0..3 {
            migrate(&mut conn).unwrap();
        }

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows as usize, STEPS.len());
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version, description, applied_at) VALUES (99, 'future', 0)",
            [],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
