//! The database handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docshelf_core::{DatabaseConfiguration, Scope};
use docshelf_store::{SqliteStore, Store};

use crate::collection::Collection;
use crate::error::{DatabaseError, Result};
use crate::handle::Documents;
use crate::location::{self, ContainerResolver, NoContainers, SharedContainerRoot};

static DEFAULT_SCOPE: Scope = Scope::Default;

/// A handle on one database.
///
/// Owns exactly one engine connection, or none when invalid. Document
/// operations on the handle itself target the default partition; named
/// partitions are reached through [`Database::collection`].
pub struct Database<S: Store = SqliteStore> {
    configuration: DatabaseConfiguration,
    store: Option<Arc<S>>,
    path: Option<PathBuf>,
}

impl Database<SqliteStore> {
    /// Open (or create) the database described by `configuration`.
    ///
    /// Shared containers resolve under `DOCSHELF_SHARED_CONTAINER_ROOT`.
    pub fn open(configuration: DatabaseConfiguration) -> Result<Self> {
        match SharedContainerRoot::from_env() {
            Some(root) => Self::open_with_resolver(configuration, &root),
            None => Self::open_with_resolver(configuration, &NoContainers),
        }
    }

    /// Open with an explicit shared container resolver.
    pub fn open_with_resolver(
        configuration: DatabaseConfiguration,
        resolver: &dyn ContainerResolver,
    ) -> Result<Self> {
        configuration.validate().map_err(DatabaseError::Configuration)?;
        let location = location::prepare(&configuration, resolver)?;
        let store = SqliteStore::open(&location.file)?;

        tracing::debug!(
            database = configuration.database_name(),
            path = %location.file.display(),
            "opened database"
        );
        Ok(Self {
            configuration,
            store: Some(Arc::new(store)),
            path: Some(location.file),
        })
    }

    /// Open, or log the failure and return an invalid handle.
    ///
    /// Every operation on an invalid handle fails with `InvalidConnection`.
    pub fn open_or_invalid(configuration: DatabaseConfiguration) -> Self {
        match Self::open(configuration.clone()) {
            Ok(database) => database,
            Err(e) => {
                tracing::warn!(
                    database = configuration.database_name(),
                    error = %e,
                    "could not open database; handle is invalid"
                );
                Self::invalid(configuration)
            }
        }
    }

    /// A private database backed by in-memory SQLite.
    pub fn open_in_memory(database_name: &str) -> Result<Self> {
        Self::with_store(
            DatabaseConfiguration::new(database_name),
            SqliteStore::open_memory()?,
        )
    }
}

impl<S: Store> Database<S> {
    /// Wrap an already opened engine.
    pub fn with_store(configuration: DatabaseConfiguration, store: S) -> Result<Self> {
        configuration.validate().map_err(DatabaseError::Configuration)?;
        Ok(Self {
            configuration,
            store: Some(Arc::new(store)),
            path: None,
        })
    }

    /// A handle without a connection.
    pub fn invalid(configuration: DatabaseConfiguration) -> Self {
        Self {
            configuration,
            store: None,
            path: None,
        }
    }

    /// The (lowercased) database name.
    pub fn name(&self) -> &str {
        self.configuration.database_name()
    }

    pub fn configuration(&self) -> &DatabaseConfiguration {
        &self.configuration
    }

    /// The database file, when opened from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the handle holds a connection.
    pub fn is_valid(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&Arc<S>> {
        self.store.as_ref().ok_or(DatabaseError::InvalidConnection)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collections
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve the named collection, creating it if absent.
    ///
    /// On failure the returned handle is invalid and every operation on it
    /// reports why.
    pub fn collection(&self, name: &str) -> Collection<S> {
        match self.try_collection(name) {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(collection = name, error = %e, "could not resolve collection");
                let store = self.store.as_ref().map(Arc::downgrade).unwrap_or_default();
                Collection::invalid(name, store)
            }
        }
    }

    /// Resolve the named collection, creating it if absent.
    pub fn try_collection(&self, name: &str) -> Result<Collection<S>> {
        let store = self.store()?;
        let scope = Scope::collection(name)?;
        store.create_collection(&scope)?;
        Ok(Collection::new(scope, Arc::downgrade(store)))
    }

    /// Names of the named collections, sorted.
    pub fn collection_names(&self) -> Result<Vec<String>> {
        Ok(self.store()?.collection_names()?)
    }

    /// Remove a collection with its documents and indexes.
    ///
    /// Returns `false` if it did not exist.
    pub fn delete_collection(&self, name: &str) -> Result<bool> {
        let store = self.store()?;
        let scope = Scope::collection(name)?;
        Ok(store.drop_collection(&scope)?)
    }

    /// Close the connection. Collection handles from this database turn
    /// invalid.
    pub fn close(self) {
        tracing::debug!(database = self.name(), "closing database");
    }
}

impl<S: Store> Documents for Database<S> {
    type Engine = S;

    fn resolve(&self) -> Result<(Arc<S>, &Scope)> {
        Ok((Arc::clone(self.store()?), &DEFAULT_SCOPE))
    }
}

impl<S: Store> std::fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name())
            .field("path", &self.path)
            .field("valid", &self.is_valid())
            .finish()
    }
}
