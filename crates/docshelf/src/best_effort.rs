//! Swallow-and-log access to a handle.
//!
//! For callers that prefer the fire-and-forget contract: failures are logged
//! at `warn` and replaced by an empty result. Nothing here is silent.

use docshelf_core::{Document, Expression, Query};

use crate::error::Result;
use crate::handle::Documents;

/// A view over a handle whose operations never return errors.
pub struct BestEffort<'a, D: Documents> {
    handle: &'a D,
}

impl<'a, D: Documents> BestEffort<'a, D> {
    pub fn new(handle: &'a D) -> Self {
        Self { handle }
    }

    /// The wrapped handle, for calls that should surface errors.
    pub fn handle(&self) -> &'a D {
        self.handle
    }

    pub fn save(&self, document: Document) {
        logged("save", self.handle.save(document));
    }

    pub fn save_all<I>(&self, documents: I)
    where
        I: IntoIterator<Item = Document>,
    {
        logged("save_all", self.handle.save_all(documents));
    }

    pub fn fetch_all<Q>(&self, query: Q) -> Vec<Document>
    where
        Q: Into<Query>,
    {
        logged("fetch_all", self.handle.fetch_all(query)).unwrap_or_default()
    }

    pub fn fetch(&self, id: &str) -> Option<Document> {
        logged("fetch", self.handle.fetch(id)).flatten()
    }

    /// Number of removed documents, 0 on failure.
    pub fn delete_all(&self, filter: Option<&Expression>) -> usize {
        logged("delete_all", self.handle.delete_all(filter)).unwrap_or_default()
    }

    pub fn delete(&self, id: &str) -> bool {
        logged("delete", self.handle.delete(id)).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        logged("count", self.handle.count()).unwrap_or_default()
    }
}

fn logged<T>(operation: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(operation, error = %e, "operation failed; ignoring");
            None
        }
    }
}
