//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for docshelf. It uses rusqlite with
//! bundled SQLite; document bodies are JSON text queried through the JSON1
//! functions.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use docshelf_core::{Batch, BatchReport, Document, Expression, IndexSpec, Query, Scope, WriteOp};

use crate::error::{Result, StoreError};
use crate::traits::Store;
use crate::{migration, now_millis, render};

/// How long a statement waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex: one connection, serialized access.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file, switches it to WAL journaling and runs migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        migration::migrate(&mut conn)?;

        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// The database file, or `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        f(&conn)
    }

    /// Execute an operation that needs mutable access (transactions).
    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        f(&mut conn)
    }
}

/// Fail with `CollectionNotFound` unless the scope exists.
fn ensure_scope(conn: &Connection, scope: &Scope) -> Result<()> {
    if scope_exists(conn, scope)? {
        Ok(())
    } else {
        Err(StoreError::CollectionNotFound(scope.name().to_string()))
    }
}

fn scope_exists(conn: &Connection, scope: &Scope) -> Result<bool> {
    if scope.is_default() {
        return Ok(true);
    }
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM collections WHERE name = ?1",
            params![scope.name()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_body(body: &str) -> Result<Document> {
    Document::from_json(body).map_err(|e| StoreError::InvalidData(e.to_string()))
}

/// Drop every SQLite index registered for the partition, plus their rows.
fn drop_indexes(conn: &Connection, collection: &str) -> Result<()> {
    let sql_names: Vec<String> = conn
        .prepare("SELECT sql_name FROM indexes WHERE collection = ?1")?
        .query_map(params![collection], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for sql_name in &sql_names {
        conn.execute(&render::drop_index(sql_name), [])?;
    }
    conn.execute(
        "DELETE FROM indexes WHERE collection = ?1",
        params![collection],
    )?;
    Ok(())
}

impl Store for SqliteStore {
    fn create_collection(&self, scope: &Scope) -> Result<()> {
        if scope.is_default() {
            return Ok(());
        }
        self.with_conn(|conn| {
            let created = conn.execute(
                "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
                params![scope.name(), now_millis()],
            )?;
            if created > 0 {
                tracing::info!(collection = %scope, "created collection");
            }
            Ok(())
        })
    }

    fn has_collection(&self, scope: &Scope) -> Result<bool> {
        self.with_conn(|conn| scope_exists(conn, scope))
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let names = conn
                .prepare("SELECT name FROM collections ORDER BY name")?
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
    }

    fn drop_collection(&self, scope: &Scope) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if !scope_exists(&tx, scope)? {
                return Ok(false);
            }

            drop_indexes(&tx, scope.name())?;
            let removed = tx.execute(
                "DELETE FROM documents WHERE collection = ?1",
                params![scope.name()],
            )?;
            if !scope.is_default() {
                tx.execute(
                    "DELETE FROM collections WHERE name = ?1",
                    params![scope.name()],
                )?;
            }
            tx.commit()?;

            tracing::info!(collection = %scope, documents = removed, "dropped collection");
            Ok(true)
        })
    }

    fn apply(&self, scope: &Scope, batch: &Batch) -> Result<BatchReport> {
        batch.validate()?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            ensure_scope(&tx, scope)?;

            let now = now_millis();
            let mut report = BatchReport::default();
            {
                let mut upsert = tx.prepare_cached(
                    "INSERT INTO documents (collection, id, body, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (collection, id)
                     DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
                )?;
                let mut remove = tx
                    .prepare_cached("DELETE FROM documents WHERE collection = ?1 AND id = ?2")?;

                for op in batch.ops() {
                    match op {
                        WriteOp::Save(document) => {
                            let body = document
                                .to_json()
                                .map_err(|e| StoreError::Serialization(e.to_string()))?;
                            upsert.execute(params![scope.name(), document.id, body, now])?;
                            report.saved += 1;
                        }
                        WriteOp::Delete(id) => {
                            report.deleted += remove.execute(params![scope.name(), id])?;
                        }
                    }
                }
            }
            tx.commit()?;

            tracing::debug!(
                collection = %scope,
                saved = report.saved,
                deleted = report.deleted,
                "applied batch"
            );
            Ok(report)
        })
    }

    fn get(&self, scope: &Scope, id: &str) -> Result<Option<Document>> {
        self.with_conn(|conn| {
            ensure_scope(conn, scope)?;
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![scope.name(), id],
                    |row| row.get(0),
                )
                .optional()?;
            body.as_deref().map(parse_body).transpose()
        })
    }

    fn query(&self, scope: &Scope, query: &Query) -> Result<Vec<Document>> {
        let rendered = render::select(scope.name(), query)?;

        self.with_conn(|conn| {
            ensure_scope(conn, scope)?;
            let bodies = conn
                .prepare_cached(&rendered.sql)?
                .query_map(params_from_iter(rendered.params.iter()), |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            tracing::debug!(collection = %scope, results = bodies.len(), "ran query");
            bodies.iter().map(|body| parse_body(body)).collect()
        })
    }

    fn delete_matching(&self, scope: &Scope, filter: Option<&Expression>) -> Result<usize> {
        let rendered = render::delete(scope.name(), filter)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            ensure_scope(&tx, scope)?;
            let removed = tx.execute(&rendered.sql, params_from_iter(rendered.params.iter()))?;
            tx.commit()?;

            tracing::debug!(collection = %scope, removed, "deleted matching documents");
            Ok(removed)
        })
    }

    fn count(&self, scope: &Scope) -> Result<usize> {
        self.with_conn(|conn| {
            ensure_scope(conn, scope)?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![scope.name()],
                |row| row.get(0),
            )?;
            usize::try_from(count).map_err(|e| StoreError::InvalidData(e.to_string()))
        })
    }

    fn create_index(&self, scope: &Scope, name: &str, index: &IndexSpec) -> Result<()> {
        index.validate(name)?;
        let sql_name = render::index_sql_name(scope.name(), name);
        let create = render::create_index(&sql_name, index)?;
        let paths: Vec<&str> = index.paths().iter().map(|path| path.as_str()).collect();
        let paths =
            serde_json::to_string(&paths).map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            ensure_scope(&tx, scope)?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM indexes WHERE collection = ?1 AND name = ?2",
                    params![scope.name(), name],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::IndexExists {
                    collection: scope.name().to_string(),
                    name: name.to_string(),
                });
            }

            tx.execute(&create, [])?;
            tx.execute(
                "INSERT INTO indexes (collection, name, sql_name, paths, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![scope.name(), name, sql_name, paths, now_millis()],
            )?;
            tx.commit()?;

            tracing::info!(collection = %scope, index = name, "created index");
            Ok(())
        })
    }

    fn delete_index(&self, scope: &Scope, name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            ensure_scope(&tx, scope)?;

            let sql_name: Option<String> = tx
                .query_row(
                    "SELECT sql_name FROM indexes WHERE collection = ?1 AND name = ?2",
                    params![scope.name(), name],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(sql_name) = sql_name else {
                return Err(StoreError::IndexNotFound {
                    collection: scope.name().to_string(),
                    name: name.to_string(),
                });
            };

            tx.execute(&render::drop_index(&sql_name), [])?;
            tx.execute(
                "DELETE FROM indexes WHERE collection = ?1 AND name = ?2",
                params![scope.name(), name],
            )?;
            tx.commit()?;

            tracing::info!(collection = %scope, index = name, "deleted index");
            Ok(())
        })
    }

    fn index_names(&self, scope: &Scope) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            ensure_scope(conn, scope)?;
            let names = conn
                .prepare("SELECT name FROM indexes WHERE collection = ?1 ORDER BY name")?
                .query_map(params![scope.name()], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
    }
}
