//! Store trait: the engine seam behind every docshelf handle.
//!
//! Implementations include SQLite (primary) and in-memory (for tests). All
//! calls are synchronous and local.

use docshelf_core::{Batch, BatchReport, Document, Expression, IndexSpec, Query, Scope};

use crate::error::Result;

/// The Store trait: document persistence for one database.
///
/// # Design Notes
///
/// - **Scopes**: every document operation names the partition it targets.
///   [`Scope::Default`] always exists; named collections must be created first
///   and operations on unknown ones fail with `CollectionNotFound`.
/// - **Atomic batches**: [`Store::apply`] and [`Store::delete_matching`] run as
///   one engine transaction. Readers never observe a partial batch and a
///   failure applies nothing.
/// - **Deterministic order**: query results are sorted by the requested
///   orderings and then by ascending id.
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Collection Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a named collection if it does not exist yet.
    fn create_collection(&self, scope: &Scope) -> Result<()>;

    /// Check whether the scope exists.
    fn has_collection(&self, scope: &Scope) -> Result<bool>;

    /// Names of all named collections, sorted.
    fn collection_names(&self) -> Result<Vec<String>>;

    /// Remove a named collection with its documents and indexes.
    ///
    /// Returns `false` if the collection did not exist. The default scope is
    /// emptied instead of removed.
    fn drop_collection(&self, scope: &Scope) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Document Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a batch of saves and deletes atomically.
    fn apply(&self, scope: &Scope, batch: &Batch) -> Result<BatchReport>;

    /// Get a document by id.
    fn get(&self, scope: &Scope, id: &str) -> Result<Option<Document>>;

    /// Run a select-all query.
    fn query(&self, scope: &Scope, query: &Query) -> Result<Vec<Document>>;

    /// Delete every document matching `filter` (all documents when `None`).
    ///
    /// Resolving the matching set and deleting it happen in one transaction.
    /// Returns the number of documents removed.
    fn delete_matching(&self, scope: &Scope, filter: Option<&Expression>) -> Result<usize>;

    /// Number of documents in the scope.
    fn count(&self, scope: &Scope) -> Result<usize>;

    // ─────────────────────────────────────────────────────────────────────────
    // Index Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a value index. Fails with `IndexExists` on a duplicate name.
    fn create_index(&self, scope: &Scope, name: &str, index: &IndexSpec) -> Result<()>;

    /// Remove an index. Fails with `IndexNotFound` if absent.
    fn delete_index(&self, scope: &Scope, name: &str) -> Result<()>;

    /// Names of the indexes in the scope, sorted.
    fn index_names(&self, scope: &Scope) -> Result<Vec<String>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Upsert a single document.
    fn save_one(&self, scope: &Scope, document: &Document) -> Result<()>;

    /// Delete a single document. Returns `true` if it existed.
    fn delete_one(&self, scope: &Scope, id: &str) -> Result<bool>;
}

impl<S: Store + ?Sized> StoreExt for S {
    fn save_one(&self, scope: &Scope, document: &Document) -> Result<()> {
        let batch = Batch::new().save(document.clone());
        self.apply(scope, &batch).map(|_| ())
    }

    fn delete_one(&self, scope: &Scope, id: &str) -> Result<bool> {
        let batch = Batch::new().delete(id);
        self.apply(scope, &batch).map(|report| report.deleted > 0)
    }
}
