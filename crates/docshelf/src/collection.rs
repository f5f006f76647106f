//! Collection handles.

use std::sync::{Arc, Weak};

use docshelf_core::{IndexSpec, Scope};
use docshelf_store::{SqliteStore, Store};

use crate::error::{DatabaseError, Result};
use crate::handle::Documents;

/// A handle on one named collection.
///
/// Holds a weak reference to the owning database's engine: once the
/// database is closed or dropped, operations fail with `InvalidConnection`.
pub struct Collection<S: Store = SqliteStore> {
    name: String,
    scope: Option<Scope>,
    store: Weak<S>,
}

impl<S: Store> Collection<S> {
    pub(crate) fn new(scope: Scope, store: Weak<S>) -> Self {
        Self {
            name: scope.name().to_string(),
            scope: Some(scope),
            store,
        }
    }

    /// A handle for a collection that failed to resolve.
    pub(crate) fn invalid(name: &str, store: Weak<S>) -> Self {
        Self {
            name: name.to_string(),
            scope: None,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the collection resolved and its database is still open.
    pub fn is_valid(&self) -> bool {
        self.scope.is_some() && self.store.strong_count() > 0
    }

    /// Create a value index over `index`'s paths.
    ///
    /// Duplicate names are rejected by the engine.
    pub fn create_index(&self, index: &IndexSpec, name: &str) -> Result<()> {
        let (store, scope) = self.resolve()?;
        store.create_index(scope, name, index)?;
        Ok(())
    }

    pub fn delete_index(&self, name: &str) -> Result<()> {
        let (store, scope) = self.resolve()?;
        store.delete_index(scope, name)?;
        Ok(())
    }

    /// Names of this collection's indexes, sorted.
    pub fn indexes(&self) -> Result<Vec<String>> {
        let (store, scope) = self.resolve()?;
        Ok(store.index_names(scope)?)
    }
}

impl<S: Store> Documents for Collection<S> {
    type Engine = S;

    fn resolve(&self) -> Result<(Arc<S>, &Scope)> {
        let store = self.store.upgrade().ok_or(DatabaseError::InvalidConnection)?;
        let scope = self
            .scope
            .as_ref()
            .ok_or_else(|| DatabaseError::InvalidCollection(self.name.clone()))?;
        Ok((store, scope))
    }
}

impl<S: Store> Clone for Collection<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            scope: self.scope.clone(),
            store: Weak::clone(&self.store),
        }
    }
}

impl<S: Store> std::fmt::Debug for Collection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("valid", &self.is_valid())
            .finish()
    }
}
