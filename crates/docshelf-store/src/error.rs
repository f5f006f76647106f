//! Error types for the store module.

use docshelf_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid input rejected before reaching the engine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The named collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The named index does not exist.
    #[error("index not found: {collection}.{name}")]
    IndexNotFound { collection: String, name: String },

    /// An index with this name already exists in the collection.
    #[error("index already exists: {collection}.{name}")]
    IndexExists { collection: String, name: String },

    /// Document serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the engine was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
