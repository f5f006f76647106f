//! The operation set shared by database and collection handles.

use std::sync::Arc;

use docshelf_core::{Batch, BatchReport, Document, Expression, Query, Scope};
use docshelf_store::{Store, StoreExt};

use crate::best_effort::BestEffort;
use crate::error::Result;

/// CRUD and query operations over one partition of a database.
///
/// Implementors only supply [`Documents::resolve`]; every operation goes
/// through it, so an invalid handle fails the same way everywhere.
pub trait Documents {
    /// The engine behind the handle.
    type Engine: Store;

    /// The live engine and the partition this handle targets.
    ///
    /// Fails with `InvalidConnection` when the engine is gone and with
    /// `InvalidCollection` when the partition could not be resolved.
    fn resolve(&self) -> Result<(Arc<Self::Engine>, &Scope)>;

    /// Save (upsert) one document.
    fn save(&self, document: Document) -> Result<()> {
        let (store, scope) = self.resolve()?;
        store.save_one(scope, &document)?;
        Ok(())
    }

    /// Save several documents in one transaction.
    fn save_all<I>(&self, documents: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = Document>,
    {
        self.write_batch(&Batch::saving(documents))
    }

    /// Apply a mixed batch of saves and deletes in one transaction.
    fn write_batch(&self, batch: &Batch) -> Result<BatchReport> {
        let (store, scope) = self.resolve()?;
        Ok(store.apply(scope, batch)?)
    }

    /// Documents matching the query, in its order (ties by ascending id).
    ///
    /// Accepts a [`Query`] or a bare [`Expression`].
    fn fetch_all<Q>(&self, query: Q) -> Result<Vec<Document>>
    where
        Q: Into<Query>,
    {
        let (store, scope) = self.resolve()?;
        Ok(store.query(scope, &query.into())?)
    }

    /// The document with `id`, if present.
    fn fetch(&self, id: &str) -> Result<Option<Document>> {
        let (store, scope) = self.resolve()?;
        Ok(store.get(scope, id)?)
    }

    /// Delete every document matching `filter`, or all of them for `None`.
    ///
    /// Returns the number of documents removed.
    fn delete_all(&self, filter: Option<&Expression>) -> Result<usize> {
        let (store, scope) = self.resolve()?;
        Ok(store.delete_matching(scope, filter)?)
    }

    /// Delete one document. Returns `true` if it existed.
    fn delete(&self, id: &str) -> Result<bool> {
        let (store, scope) = self.resolve()?;
        Ok(store.delete_one(scope, id)?)
    }

    /// Number of documents in the partition.
    fn count(&self) -> Result<usize> {
        let (store, scope) = self.resolve()?;
        Ok(store.count(scope)?)
    }

    /// Swallow-and-log view of this handle.
    fn best_effort(&self) -> BestEffort<'_, Self>
    where
        Self: Sized,
    {
        BestEffort::new(self)
    }
}
