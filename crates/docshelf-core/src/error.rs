//! Error types for docshelf core.

use thiserror::Error;

/// Errors raised while building or validating core values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid database name {name:?}: {reason}")]
    InvalidDatabaseName { name: String, reason: &'static str },

    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollectionName { name: String, reason: &'static str },

    #[error("invalid index name {name:?}: {reason}")]
    InvalidIndexName { name: String, reason: &'static str },

    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("document id must not be empty")]
    EmptyDocumentId,

    #[error("index must cover at least one path")]
    EmptyIndex,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("could not decode document {id}: {message}")]
    Decoding { id: String, message: String },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
