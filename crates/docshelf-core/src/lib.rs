//! # docshelf core
//!
//! Core values shared by every docshelf crate: documents, scopes, database
//! configuration, write batches and query expressions.
//!
//! ## Key Types
//!
//! - [`Document`] - An id plus an opaque attribute map
//! - [`Scope`] - The database-level partition or a named collection
//! - [`DatabaseConfiguration`] - Name, shared container and directory settings
//! - [`Batch`] - Writes applied with all-or-nothing visibility
//! - [`Query`], [`Expression`], [`Ordering`] - Filter and sort descriptions
//! - [`IndexSpec`] - A value index over one or more paths
//!
//! ## Usage
//!
//! ```rust
//! use docshelf_core::{attr, Document, Query};
//! use serde_json::json;
//!
//! let attributes = json!({"name": "Brad", "last_name": "Depp"});
//! let doc = Document::with_attributes("1", attributes.as_object().unwrap().clone());
//! assert_eq!(doc.get_str("name"), Some("Brad"));
//!
//! let query = Query::matching(attr("name").eq("Brad")).order_by(attr("last_name").asc());
//! assert!(query.validate().is_ok());
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod query;
pub mod types;

pub use batch::{Batch, BatchReport, WriteOp};
pub use config::DatabaseConfiguration;
pub use error::{CoreError, Result};
pub use query::{
    attr, field, CompareOp, Direction, Expression, FieldFilter, FieldPath, IndexSpec, Ordering,
    Query,
};
pub use types::{kind_name, Attributes, CollectionName, Document, Scope, DEFAULT_COLLECTION};

pub use serde_json::{json, Map, Value};
