//! # docshelf
//!
//! A small document database facade over embedded SQLite: save, fetch,
//! filter, sort and delete JSON documents, and turn them into typed values.
//!
//! ## Overview
//!
//! - **Database**: one handle per database file. Operations on it target the
//!   default partition.
//! - **Collection**: a named partition, created on first use.
//! - **Documents**: the operation set both handles share.
//! - **Typed access**: [`DecodeExt`] decodes through serde, [`MapExt`]
//!   through a declared field mapping.
//!
//! ## Usage
//!
//! ```rust
//! use docshelf::{attr, Database, DecodeExt, Document, Documents, Query};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     name: String,
//!     last_name: String,
//! }
//!
//! let db = Database::open_in_memory("people").unwrap();
//! let users = db.collection("users");
//!
//! users
//!     .save_all([
//!         Document::from_serialize("1", &json!({"name": "Brad", "last_name": "Depp"})).unwrap(),
//!         Document::from_serialize("2", &json!({"name": "Brian", "last_name": "May"})).unwrap(),
//!     ])
//!     .unwrap();
//!
//! let query = Query::matching(attr("name").glob("Br*")).order_by(attr("name").asc());
//! let decoded = users.fetch_all_as::<User, _>(query).unwrap();
//! assert_eq!(decoded.items[0].last_name, "Depp");
//! assert_eq!(decoded.items[1].name, "Brian");
//! ```
//!
//! ## Re-exports
//!
//! - `docshelf::core` - Documents, scopes, configuration and query expressions
//! - `docshelf::store` - The engine seam, SQLite and in-memory engines

pub mod best_effort;
pub mod codable;
pub mod collection;
pub mod database;
pub mod error;
pub mod handle;
pub mod location;
pub mod mapper;

// Re-export component crates
pub use docshelf_core as core;
pub use docshelf_store as store;

// Re-export main types for convenience
pub use best_effort::BestEffort;
pub use codable::{decode_documents, DecodeExt, Decoded, SkippedRecord};
pub use collection::Collection;
pub use database::Database;
pub use error::{DatabaseError, Result};
pub use handle::Documents;
pub use location::{ContainerResolver, SharedContainerRoot, StorageLocation};
pub use mapper::{map_documents, MapExt, Mappable};

// Re-export commonly used core types
pub use docshelf_core::{
    attr, field, Attributes, Batch, BatchReport, DatabaseConfiguration, Document, Expression,
    IndexSpec, Ordering, Query,
};
