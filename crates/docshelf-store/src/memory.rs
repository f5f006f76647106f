//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use docshelf_core::{
    Batch, BatchReport, Document, Expression, IndexSpec, Query, Scope, Value, WriteOp,
    DEFAULT_COLLECTION,
};

use crate::error::{Result, StoreError};
use crate::eval::{compare_documents, matches};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Partitions by persisted name; the default partition always exists.
    partitions: BTreeMap<String, Partition>,
}

#[derive(Default)]
struct Partition {
    documents: BTreeMap<String, StoredDocument>,
    indexes: BTreeMap<String, IndexSpec>,
}

struct StoredDocument {
    document: Document,
    /// Wire shape the filters and orderings evaluate against.
    wire: Value,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        let mut partitions = BTreeMap::new();
        partitions.insert(DEFAULT_COLLECTION.to_string(), Partition::default());
        Self {
            inner: RwLock::new(MemoryStoreInner { partitions }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn partition(&self, scope: &Scope) -> Result<&Partition> {
        self.partitions
            .get(scope.name())
            .ok_or_else(|| StoreError::CollectionNotFound(scope.name().to_string()))
    }

    fn partition_mut(&mut self, scope: &Scope) -> Result<&mut Partition> {
        self.partitions
            .get_mut(scope.name())
            .ok_or_else(|| StoreError::CollectionNotFound(scope.name().to_string()))
    }
}

impl Store for MemoryStore {
    fn create_collection(&self, scope: &Scope) -> Result<()> {
        let mut inner = self.write()?;
        inner
            .partitions
            .entry(scope.name().to_string())
            .or_default();
        Ok(())
    }

    fn has_collection(&self, scope: &Scope) -> Result<bool> {
        Ok(self.read()?.partitions.contains_key(scope.name()))
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        let inner = self.read()?;
        Ok(inner
            .partitions
            .keys()
            .filter(|name| name.as_str() != DEFAULT_COLLECTION)
            .cloned()
            .collect())
    }

    fn drop_collection(&self, scope: &Scope) -> Result<bool> {
        let mut inner = self.write()?;
        if scope.is_default() {
            inner.partitions.insert(DEFAULT_COLLECTION.to_string(), Partition::default());
            return Ok(true);
        }
        Ok(inner.partitions.remove(scope.name()).is_some())
    }

    fn apply(&self, scope: &Scope, batch: &Batch) -> Result<BatchReport> {
        batch.validate()?;

        let mut inner = self.write()?;
        let partition = inner.partition_mut(scope)?;

        let mut report = BatchReport::default();
        for op in batch.ops() {
            match op {
                WriteOp::Save(document) => {
                    let stored = StoredDocument {
                        document: document.clone(),
                        wire: document.to_value(),
                    };
                    partition.documents.insert(document.id.clone(), stored);
                    report.saved += 1;
                }
                WriteOp::Delete(id) => {
                    if partition.documents.remove(id).is_some() {
                        report.deleted += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    fn get(&self, scope: &Scope, id: &str) -> Result<Option<Document>> {
        let inner = self.read()?;
        let partition = inner.partition(scope)?;
        Ok(partition.documents.get(id).map(|sd| sd.document.clone()))
    }

    fn query(&self, scope: &Scope, query: &Query) -> Result<Vec<Document>> {
        query.validate()?;

        let inner = self.read()?;
        let partition = inner.partition(scope)?;

        let mut found: Vec<&StoredDocument> = partition
            .documents
            .values()
            .filter(|sd| query.filter.as_ref().map_or(true, |f| matches(f, &sd.wire)))
            .collect();
        found.sort_by(|a, b| compare_documents(&a.wire, &b.wire, &query.order_by));

        Ok(found
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|sd| sd.document.clone())
            .collect())
    }

    fn delete_matching(&self, scope: &Scope, filter: Option<&Expression>) -> Result<usize> {
        if let Some(filter) = filter {
            filter.validate()?;
        }

        let mut inner = self.write()?;
        let partition = inner.partition_mut(scope)?;

        let before = partition.documents.len();
        partition
            .documents
            .retain(|_, sd| !filter.map_or(true, |f| matches(f, &sd.wire)));
        Ok(before - partition.documents.len())
    }

    fn count(&self, scope: &Scope) -> Result<usize> {
        let inner = self.read()?;
        Ok(inner.partition(scope)?.documents.len())
    }

    fn create_index(&self, scope: &Scope, name: &str, index: &IndexSpec) -> Result<()> {
        index.validate(name)?;

        let mut inner = self.write()?;
        let partition = inner.partition_mut(scope)?;
        if partition.indexes.contains_key(name) {
            return Err(StoreError::IndexExists {
                collection: scope.name().to_string(),
                name: name.to_string(),
            });
        }
        partition.indexes.insert(name.to_string(), index.clone());
        Ok(())
    }

    fn delete_index(&self, scope: &Scope, name: &str) -> Result<()> {
        let mut inner = self.write()?;
        let partition = inner.partition_mut(scope)?;
        partition
            .indexes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::IndexNotFound {
                collection: scope.name().to_string(),
                name: name.to_string(),
            })
    }

    fn index_names(&self, scope: &Scope) -> Result<Vec<String>> {
        let inner = self.read()?;
        Ok(inner.partition(scope)?.indexes.keys().cloned().collect())
    }
}
