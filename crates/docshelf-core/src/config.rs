//! Database configuration.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Configuration for opening a database.
///
/// Created once by the caller and consumed when the database is opened.
/// The database name is normalized to lowercase on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfiguration {
    database_name: String,
    shared_container_id: Option<String>,
    directory: Option<PathBuf>,
}

impl DatabaseConfiguration {
    /// Create a configuration for the named database.
    pub fn new(database_name: impl AsRef<str>) -> Self {
        Self {
            database_name: database_name.as_ref().to_lowercase(),
            shared_container_id: None,
            directory: None,
        }
    }

    /// Place the database inside the shared container with this identifier.
    ///
    /// When the container cannot be resolved at open time, the configured
    /// directory (or the working directory) is used instead.
    pub fn with_shared_container(mut self, identifier: impl Into<String>) -> Self {
        self.shared_container_id = Some(identifier.into());
        self
    }

    /// Base directory used when no shared container applies.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// The lowercased database name.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// The shared container identifier, if any.
    pub fn shared_container_id(&self) -> Option<&str> {
        self.shared_container_id.as_deref()
    }

    /// The configured base directory, if any.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Check that the database name can be used as a directory name.
    pub fn validate(&self) -> Result<()> {
        let name = &self.database_name;
        let invalid = |reason| CoreError::InvalidDatabaseName {
            name: name.clone(),
            reason,
        };

        if name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if name == "." || name == ".." {
            return Err(invalid("name must not be a relative path component"));
        }
        if name.contains(['/', '\\', '\0']) {
            return Err(invalid("name must not contain path separators"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_lowercased() {
        let config = DatabaseConfiguration::new("User");
        assert_eq!(config.database_name(), "user");
        assert!(config.shared_container_id().is_none());
        assert!(config.directory().is_none());
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfiguration::new("Notes")
            .with_shared_container("group.com.example")
            .with_directory("/tmp/data");
        assert_eq!(config.shared_container_id(), Some("group.com.example"));
        assert_eq!(config.directory(), Some(Path::new("/tmp/data")));
    }

    #[test]
    fn test_validate() {
        assert!(DatabaseConfiguration::new("user").validate().is_ok());
        assert!(DatabaseConfiguration::new("").validate().is_err());
        assert!(DatabaseConfiguration::new("  ").validate().is_err());
        assert!(DatabaseConfiguration::new("..").validate().is_err());
        assert!(DatabaseConfiguration::new("a/b").validate().is_err());
        assert!(DatabaseConfiguration::new("a\\b").validate().is_err());
    }
}
