//! # docshelf store
//!
//! Engine abstraction for docshelf. Provides a trait-based interface for
//! document persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts the embedded engine behind the [`Store`] trait,
//! so database and collection handles stay engine-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The synchronous trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`StoreExt`] - Single-document conveniences on top of batches
//!
//! ## Usage
//!
//! ```rust
//! use docshelf_core::{attr, Batch, Document, Query, Scope};
//! use docshelf_store::{SqliteStore, Store, StoreExt};
//!
//! let store = SqliteStore::open_memory().unwrap();
//! store.save_one(&Scope::Default, &Document::new("1")).unwrap();
//!
//! let users = Scope::collection("users").unwrap();
//! store.create_collection(&users).unwrap();
//! store.apply(&users, &Batch::new().save(Document::new("a"))).unwrap();
//!
//! let all = store.query(&users, &Query::all()).unwrap();
//! assert_eq!(all.len(), 1);
//! ```
//!
//! ## Design Notes
//!
//! - **One transaction per batch**: a batch is either fully visible or not at all
//! - **Engine parity**: both stores agree on filters, ordering and tie-breaks
//! - **Literal JSON paths**: query expressions match value index expressions

pub mod error;
pub mod eval;
pub mod memory;
pub mod migration;
pub mod pattern;
pub mod render;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
