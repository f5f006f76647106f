//! Error types for database and collection handles.

use docshelf_core::CoreError;
use docshelf_store::StoreError;
use thiserror::Error;

/// Errors that can occur through a docshelf handle.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The handle has no live engine connection: it failed to open, was
    /// closed, or its database was dropped.
    #[error("invalid connection: the database is not open")]
    InvalidConnection,

    /// The collection could not be resolved, created, or no longer exists.
    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    /// A stored document does not decode into the requested type.
    #[error("could not decode document {id}: {message}")]
    DecodeFailure { id: String, message: String },

    /// Application-defined failure.
    #[error("{0}")]
    Custom(String),

    /// The database configuration was rejected.
    #[error("invalid configuration: {0}")]
    Configuration(#[source] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[source] StoreError),

    /// I/O error while preparing the storage location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for DatabaseError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CollectionNotFound(name) => DatabaseError::InvalidCollection(name),
            StoreError::Core(core) => core.into(),
            other => DatabaseError::Store(other),
        }
    }
}

impl From<CoreError> for DatabaseError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCollectionName { name, .. } => DatabaseError::InvalidCollection(name),
            CoreError::Decoding { id, message } => DatabaseError::DecodeFailure { id, message },
            err @ CoreError::InvalidDatabaseName { .. } => DatabaseError::Configuration(err),
            other => DatabaseError::Store(StoreError::Core(other)),
        }
    }
}

/// Result type for handle operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_collection_is_invalid_collection() {
        let err: DatabaseError = StoreError::CollectionNotFound("users".into()).into();
        assert!(matches!(err, DatabaseError::InvalidCollection(name) if name == "users"));
    }

    #[test]
    fn test_invalid_name_is_invalid_collection() {
        let core = CoreError::InvalidCollectionName {
            name: "_users".into(),
            reason: "name must not start with '_' or '%'",
        };
        let err: DatabaseError = StoreError::Core(core).into();
        assert!(matches!(err, DatabaseError::InvalidCollection(name) if name == "_users"));
    }

    #[test]
    fn test_decoding_is_decode_failure() {
        let err: DatabaseError = CoreError::Decoding {
            id: "3".into(),
            message: "missing field `last_name`".into(),
        }
        .into();
        assert!(matches!(err, DatabaseError::DecodeFailure { id, .. } if id == "3"));
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let err: DatabaseError = StoreError::Migration("too new".into()).into();
        assert!(matches!(err, DatabaseError::Store(StoreError::Migration(_))));

        let err: DatabaseError = CoreError::EmptyDocumentId.into();
        assert!(matches!(
            err,
            DatabaseError::Store(StoreError::Core(CoreError::EmptyDocumentId))
        ));
    }
}
